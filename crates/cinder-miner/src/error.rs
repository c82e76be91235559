//! Miner error types.

use thiserror::Error;

/// Miner errors.
///
/// Transaction-level failures (execution rejections, blocks that are full)
/// are handled inside the selection loop and never surface here; only
/// collaborator failures do.
#[derive(Error, Debug)]
pub enum MinerError {
    /// The state journal failed.
    #[error("State error: {0}")]
    State(#[from] cinder_state::StateError),
}

/// Result type for miner operations.
pub type MinerResult<T> = Result<T, MinerError>;
