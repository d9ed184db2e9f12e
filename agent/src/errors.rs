//! Error types for the conveyor agent

use thiserror::Error;

/// Main error type for the conveyor agent
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("State store error: {0}")]
    StoreError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Whether this is the benign "no new data / no prior record" signal.
    /// Callers use this for control flow; it is never treated as a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentError::NotFound(_))
    }

    /// Whether this error was raised at construction time from bad config.
    pub fn is_invalid_config(&self) -> bool {
        matches!(self, AgentError::InvalidConfig(_))
    }

    /// Whether a remote answered with a status code we do not handle.
    pub fn is_unexpected_status(&self) -> bool {
        matches!(self, AgentError::UnexpectedStatus(_))
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Internal(err.to_string())
    }
}
