//! Error types for the orchestrator.

use thiserror::Error;

/// Orchestrator-specific errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Required credentials are not configured; no session is created.
    #[error("missing required configuration: {}", .0.join(", "))]
    ConfigurationMissing(Vec<String>),

    /// The scenario name is not known.
    #[error("unknown scenario: {0} (expected travel, customer_service or assistant)")]
    UnknownScenario(String),

    /// The knowledge file could not be loaded.
    #[error("knowledge base error: {0}")]
    Knowledge(#[from] huddle_agents::RetrievalError),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
