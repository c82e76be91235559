//! # cinder-state
//!
//! State management interfaces for the cinder development node.
//!
//! This crate provides:
//! - The [`StateJournal`] trait: asynchronous checkpoint/commit/revert
//!   sequencing plus keyed reads and writes
//! - [`MemoryJournal`], an overlay-stack in-memory implementation used by
//!   the development node
//!
//! The journal is the miner's exclusive resource during a block build: the
//! miner opens a block-level checkpoint around the whole selection loop and
//! a transaction-level checkpoint around each execution, committing or
//! reverting each one on every exit path.

mod error;
mod journal;
mod memory;

pub use error::{StateError, StateResult};
pub use journal::StateJournal;
pub use memory::{JournalStats, MemoryJournal};
