//! Error types for the agents crate.

use thiserror::Error;

/// Errors from a language-model pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The HTTP request could not be sent or completed.
    #[error("pipeline request failed: {0}")]
    Http(String),

    /// The model API answered with a non-success status.
    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("failed to parse model response: {0}")]
    ResponseParse(String),

    /// The model returned neither text nor tool calls.
    #[error("model returned an empty response")]
    Empty,

    /// A scripted pipeline was told to fail.
    #[error("scripted failure: {0}")]
    Scripted(String),
}

/// Errors from the knowledge-retrieval collaborator.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The chunk file could not be read.
    #[error("failed to read knowledge file: {0}")]
    Io(#[from] std::io::Error),

    /// The chunk file is not valid JSON.
    #[error("failed to parse knowledge file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The index cannot serve queries.
    #[error("knowledge index unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the meeting-room collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// Joining the room was refused.
    #[error("failed to join room: {0}")]
    Join(String),

    /// The session has not joined a room.
    #[error("not joined to a room")]
    NotJoined,
}

/// Errors that can occur in agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Tool not found.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool arguments.
    #[error("invalid tool arguments for {tool_name}: {message}")]
    InvalidArguments {
        /// Name of the tool.
        tool_name: String,
        /// Error message.
        message: String,
    },

    /// Pipeline error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Room error.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
