//! Error types for the agent scheduler.

use thiserror::Error;

use crate::atomspace::AtomSpaceError;

#[derive(Debug, Error)]
pub enum MindAgentError {
    #[error("agent not found: {0}")]
    NotFound(String),

    #[error("agent is disabled: {0}")]
    AgentDisabled(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    AtomSpace(#[from] AtomSpaceError),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("state encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("background task failed: {0}")]
    Background(String),

    #[error("mindagent instance '{0}' is not running")]
    Unavailable(String),
}

/// Result type for scheduler operations.
pub type MindAgentResult<T> = std::result::Result<T, MindAgentError>;
