//! State error types.

use thiserror::Error;

/// State errors.
#[derive(Error, Debug)]
pub enum StateError {
    /// `commit` was called with no open checkpoint.
    #[error("Commit called with no open checkpoint")]
    CommitWithoutCheckpoint,

    /// `revert` was called with no open checkpoint.
    #[error("Revert called with no open checkpoint")]
    RevertWithoutCheckpoint,

    /// The backing store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
