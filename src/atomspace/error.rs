//! Error types for the atom store.

use thiserror::Error;

use super::types::AtomType;

/// Errors from atom store operations. Client-caused kinds are kept distinct so
/// callers can map them individually.
#[derive(Debug, Error)]
pub enum AtomSpaceError {
    #[error("{atom_type} named '{name}' already exists")]
    DuplicateName { atom_type: AtomType, name: String },

    #[error("outgoing set references missing atoms: {}", missing.join(", "))]
    DanglingReference { missing: Vec<String> },

    #[error("link outgoing set must not be empty")]
    EmptyOutgoing,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("atomspace instance '{0}' is not running")]
    Unavailable(String),
}

/// Result type for atom store operations.
pub type AtomSpaceResult<T> = std::result::Result<T, AtomSpaceError>;
