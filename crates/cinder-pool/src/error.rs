//! Error types for the pool.

use alloy_primitives::{Address, B256};
use thiserror::Error;

/// Pool errors.
#[derive(Error, Debug)]
pub enum PoolError {
    /// Transaction was already finalized and cannot be queued again.
    #[error("Transaction already finalized: {0}")]
    AlreadyFinalized(B256),

    /// A transaction with the same nonce is already queued for this origin.
    #[error("Nonce {nonce} already queued for origin {origin}")]
    NonceAlreadyQueued { origin: Address, nonce: u64 },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
