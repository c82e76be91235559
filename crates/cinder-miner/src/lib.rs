//! # cinder-miner
//!
//! Block-production miner for the cinder development node.
//!
//! This crate provides:
//! - The gas-price-ordered selection heap with one candidate per origin
//! - Checkpoint/commit/revert sequencing over the state journal
//! - Block assembly: transaction and receipt tries, bloom and gas
//!   aggregation
//! - The miner controller (`mine`/`pause`/`resume`) with single-entry
//!   builds and deferred re-entry
//! - A typed event surface (`block` and `idle`) with awaitable sinks for
//!   back-pressured consumers
//!
//! ## Architecture
//!
//! `Miner::mine` seeds the priced heap from the live pool view, then
//! repeatedly picks the best candidate, executes it through the [`Vm`]
//! under a nested checkpoint, and either commits it into the block being
//! assembled or returns it to the pool. Sealed blocks are announced on the
//! event surface; consumers persist them and finalize the included
//! transactions.

mod assembler;
mod block;
mod checkpoints;
mod error;
mod events;
mod heap;
mod miner;
mod vm;

pub use assembler::{BlockArtifact, BlockAssembler, OrderedTrie};
pub use block::{Block, BlockFactory, BlockHeader};
pub use checkpoints::{CheckpointGuard, Checkpoints};
pub use error::{MinerError, MinerResult};
pub use events::{BlockSink, MinerEvents};
pub use heap::PricedHeap;
pub use miner::{
    Miner, MinerConfig, DEFAULT_BLOCK_GAS_LIMIT, UNLIMITED_TRANSACTIONS,
};
pub use vm::{Vm, VmError};

pub use cinder_pool::ExecutionResult;
