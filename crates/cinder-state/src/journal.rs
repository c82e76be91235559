//! The journaled state interface.

use crate::StateResult;
use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;

/// Asynchronous journaled key-value state.
///
/// Checkpoints nest: each `checkpoint` opens a new layer and each `commit`
/// or `revert` closes the most recent one. Writes always land in the open
/// layer; reads observe the newest value across all layers. Closing a layer
/// that was never opened is an error.
#[async_trait]
pub trait StateJournal: Send + Sync {
    /// Open a new checkpoint layer.
    async fn checkpoint(&self) -> StateResult<()>;

    /// Fold the most recent layer into its parent.
    async fn commit(&self) -> StateResult<()>;

    /// Discard the most recent layer.
    async fn revert(&self) -> StateResult<()>;

    /// Write a value into the open layer (or the base, if none is open).
    async fn insert(&self, key: B256, value: Bytes) -> StateResult<()>;

    /// Read the newest value for a key.
    async fn get(&self, key: B256) -> StateResult<Option<Bytes>>;

    /// Number of currently open checkpoints.
    fn depth(&self) -> usize;
}
