//! In-memory overlay-stack journal.

use crate::{StateError, StateJournal, StateResult};
use alloy_primitives::{Bytes, B256};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Counters over a journal's lifetime, used to verify checkpoint pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalStats {
    /// Checkpoints opened.
    pub checkpoints_opened: u64,
    /// Checkpoints committed.
    pub commits: u64,
    /// Checkpoints reverted.
    pub reverts: u64,
}

#[derive(Debug, Default)]
struct Layers {
    base: HashMap<B256, Bytes>,
    overlays: Vec<HashMap<B256, Bytes>>,
}

/// An in-memory [`StateJournal`] backed by a base map plus one overlay per
/// open checkpoint.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    layers: RwLock<Layers>,
    checkpoints_opened: AtomicU64,
    commits: AtomicU64,
    reverts: AtomicU64,
}

impl MemoryJournal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime operation counters.
    pub fn stats(&self) -> JournalStats {
        JournalStats {
            checkpoints_opened: self.checkpoints_opened.load(Ordering::SeqCst),
            commits: self.commits.load(Ordering::SeqCst),
            reverts: self.reverts.load(Ordering::SeqCst),
        }
    }

    /// Number of keys visible across all layers.
    pub fn len(&self) -> usize {
        let layers = self.layers.read();
        let mut keys: std::collections::HashSet<&B256> = layers.base.keys().collect();
        for overlay in &layers.overlays {
            keys.extend(overlay.keys());
        }
        keys.len()
    }

    /// Whether no keys are visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StateJournal for MemoryJournal {
    async fn checkpoint(&self) -> StateResult<()> {
        let mut layers = self.layers.write();
        layers.overlays.push(HashMap::new());
        self.checkpoints_opened.fetch_add(1, Ordering::SeqCst);
        trace!(depth = layers.overlays.len(), "checkpoint opened");
        Ok(())
    }

    async fn commit(&self) -> StateResult<()> {
        let mut guard = self.layers.write();
        let layers = &mut *guard;
        let top = layers
            .overlays
            .pop()
            .ok_or(StateError::CommitWithoutCheckpoint)?;
        match layers.overlays.last_mut() {
            Some(parent) => parent.extend(top),
            None => layers.base.extend(top),
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        trace!(depth = layers.overlays.len(), "checkpoint committed");
        Ok(())
    }

    async fn revert(&self) -> StateResult<()> {
        let mut layers = self.layers.write();
        layers
            .overlays
            .pop()
            .ok_or(StateError::RevertWithoutCheckpoint)?;
        self.reverts.fetch_add(1, Ordering::SeqCst);
        trace!(depth = layers.overlays.len(), "checkpoint reverted");
        Ok(())
    }

    async fn insert(&self, key: B256, value: Bytes) -> StateResult<()> {
        let mut guard = self.layers.write();
        let layers = &mut *guard;
        match layers.overlays.last_mut() {
            Some(top) => top.insert(key, value),
            None => layers.base.insert(key, value),
        };
        Ok(())
    }

    async fn get(&self, key: B256) -> StateResult<Option<Bytes>> {
        let layers = self.layers.read();
        for overlay in layers.overlays.iter().rev() {
            if let Some(value) = overlay.get(&key) {
                return Ok(Some(value.clone()));
            }
        }
        Ok(layers.base.get(&key).cloned())
    }

    fn depth(&self) -> usize {
        self.layers.read().overlays.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    fn value(byte: u8) -> Bytes {
        Bytes::from(vec![byte])
    }

    #[tokio::test]
    async fn test_commit_folds_into_base() {
        let journal = MemoryJournal::new();
        journal.checkpoint().await.unwrap();
        journal.insert(key(1), value(1)).await.unwrap();
        journal.commit().await.unwrap();

        assert_eq!(journal.depth(), 0);
        assert_eq!(journal.get(key(1)).await.unwrap(), Some(value(1)));
    }

    #[tokio::test]
    async fn test_revert_discards_writes() {
        let journal = MemoryJournal::new();
        journal.insert(key(1), value(1)).await.unwrap();

        journal.checkpoint().await.unwrap();
        journal.insert(key(1), value(2)).await.unwrap();
        assert_eq!(journal.get(key(1)).await.unwrap(), Some(value(2)));

        journal.revert().await.unwrap();
        assert_eq!(journal.get(key(1)).await.unwrap(), Some(value(1)));
    }

    #[tokio::test]
    async fn test_nested_checkpoints() {
        let journal = MemoryJournal::new();
        journal.checkpoint().await.unwrap();
        journal.insert(key(1), value(1)).await.unwrap();

        journal.checkpoint().await.unwrap();
        journal.insert(key(2), value(2)).await.unwrap();
        assert_eq!(journal.depth(), 2);

        // Inner revert drops only the inner writes
        journal.revert().await.unwrap();
        assert_eq!(journal.get(key(2)).await.unwrap(), None);
        assert_eq!(journal.get(key(1)).await.unwrap(), Some(value(1)));

        journal.commit().await.unwrap();
        assert_eq!(journal.depth(), 0);
        assert_eq!(journal.get(key(1)).await.unwrap(), Some(value(1)));
    }

    #[tokio::test]
    async fn test_unbalanced_close_is_an_error() {
        let journal = MemoryJournal::new();
        assert!(matches!(
            journal.commit().await,
            Err(StateError::CommitWithoutCheckpoint)
        ));
        assert!(matches!(
            journal.revert().await,
            Err(StateError::RevertWithoutCheckpoint)
        ));
    }

    #[tokio::test]
    async fn test_stats_track_pairing() {
        let journal = MemoryJournal::new();
        journal.checkpoint().await.unwrap();
        journal.checkpoint().await.unwrap();
        journal.commit().await.unwrap();
        journal.revert().await.unwrap();

        let stats = journal.stats();
        assert_eq!(stats.checkpoints_opened, 2);
        assert_eq!(stats.commits + stats.reverts, 2);
        assert_eq!(journal.depth(), 0);
    }
}
