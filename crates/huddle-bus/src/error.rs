//! Error types for the bus crate.

use huddle_models::{AgentId, MessageKind};
use thiserror::Error;

/// Errors raised at the handler boundary.
#[derive(Debug, Error)]
pub enum BusError {
    /// A handler received a payload other than the one it is installed for.
    #[error("expected {expected} payload, got {actual}")]
    UnexpectedPayload {
        expected: MessageKind,
        actual: MessageKind,
    },

    /// A handler panicked while processing a message.
    #[error("handler for {kind} on {agent} panicked")]
    HandlerPanicked { agent: AgentId, kind: MessageKind },
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
