//! Error types for configuration.

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// Required credentials are absent.
    #[error("missing required environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
