//! Error types for the runtime crate.

use huddle_agents::{AgentError, RoomError};
use huddle_models::AgentId;
use thiserror::Error;

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Joining the meeting room failed.
    #[error("failed to join meeting room: {0}")]
    RoomJoin(#[from] RoomError),

    /// The agent's `on_enter` hook failed.
    #[error("agent {agent} failed to enter: {source}")]
    Enter {
        agent: AgentId,
        #[source]
        source: AgentError,
    },

    /// The agent's `on_exit` hook failed.
    #[error("agent {agent} failed to exit: {source}")]
    Exit {
        agent: AgentId,
        #[source]
        source: AgentError,
    },

    /// `run` was called on a session that already ran.
    #[error("session for {0} already started")]
    AlreadyStarted(AgentId),

    /// The session task panicked or was aborted.
    #[error("session task for {agent} did not complete: {message}")]
    TaskFailed { agent: AgentId, message: String },
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::from(RoomError::Join("empty auth token".into()));
        assert_eq!(
            err.to_string(),
            "failed to join meeting room: failed to join room: empty auth token"
        );

        let err = SessionError::Enter {
            agent: "travel_agent_1".into(),
            source: AgentError::ToolNotFound("x".into()),
        };
        assert_eq!(err.to_string(), "agent travel_agent_1 failed to enter: tool not found: x");
    }
}
