//! # cinder-pool
//!
//! Live transaction-pool view for the cinder development node.
//!
//! This crate provides:
//! - Pooled transactions with gas accounting, RLP serialization and
//!   receipt production
//! - Per-origin nonce-ordered queues
//! - The shared executable view (`pending` queues plus the `in_progress`
//!   set) consumed by the block-production miner
//! - One-shot finalization signalling between block consumers and the pool

mod error;
mod executables;
mod queue;
mod receipt;
mod transaction;

pub use error::{PoolError, PoolResult};
pub use executables::{Executables, PoolStats};
pub use queue::OriginQueue;
pub use receipt::{ExecutionResult, Receipt};
pub use transaction::{Finalization, PooledTransaction, RejectedExecution};

/// Intrinsic cost of a plain value transfer.
pub const TX_BASE_GAS: u64 = 21_000;

/// Additional intrinsic cost of a contract-creating transaction.
pub const TX_CREATION_GAS: u64 = 32_000;

/// Intrinsic cost per zero byte of calldata.
pub const TX_DATA_ZERO_GAS: u64 = 4;

/// Intrinsic cost per non-zero byte of calldata.
pub const TX_DATA_NONZERO_GAS: u64 = 16;
