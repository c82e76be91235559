//! Checkpoint sequencing over the state journal.

use crate::MinerResult;
use cinder_state::StateJournal;
use std::sync::Arc;
use tracing::error;

/// Sequencing wrapper around the journal's checkpoint primitives.
///
/// Every [`Checkpoints::checkpoint`] yields a guard that must be consumed
/// by [`CheckpointGuard::commit`] or [`CheckpointGuard::revert`], so
/// pairing holds on every exit path. The miner nests two levels: a
/// block-level checkpoint around the whole selection loop and a
/// transaction-level checkpoint around each execution.
pub struct Checkpoints {
    journal: Arc<dyn StateJournal>,
}

impl Checkpoints {
    /// Wrap a journal.
    pub fn new(journal: Arc<dyn StateJournal>) -> Self {
        Self { journal }
    }

    /// Open a checkpoint.
    pub async fn checkpoint(&self) -> MinerResult<CheckpointGuard<'_>> {
        self.journal.checkpoint().await?;
        Ok(CheckpointGuard {
            journal: &*self.journal,
            armed: true,
        })
    }

    /// Number of currently open checkpoints.
    pub fn depth(&self) -> usize {
        self.journal.depth()
    }
}

/// An open checkpoint awaiting its commit or revert.
#[must_use = "an open checkpoint must be committed or reverted"]
pub struct CheckpointGuard<'a> {
    journal: &'a dyn StateJournal,
    armed: bool,
}

impl CheckpointGuard<'_> {
    /// Fold this checkpoint into its parent.
    pub async fn commit(mut self) -> MinerResult<()> {
        self.armed = false;
        self.journal.commit().await?;
        Ok(())
    }

    /// Discard this checkpoint's writes.
    pub async fn revert(mut self) -> MinerResult<()> {
        self.armed = false;
        self.journal.revert().await?;
        Ok(())
    }
}

impl Drop for CheckpointGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            // Reverting needs an await, which Drop cannot do; the journal
            // is left unbalanced and the condition is loud instead.
            error!("checkpoint dropped without commit or revert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_state::MemoryJournal;

    #[tokio::test]
    async fn test_commit_closes_checkpoint() {
        let journal = Arc::new(MemoryJournal::new());
        let checkpoints = Checkpoints::new(Arc::clone(&journal) as Arc<dyn StateJournal>);

        let guard = checkpoints.checkpoint().await.unwrap();
        assert_eq!(checkpoints.depth(), 1);
        guard.commit().await.unwrap();
        assert_eq!(checkpoints.depth(), 0);
    }

    #[tokio::test]
    async fn test_nested_revert() {
        let journal = Arc::new(MemoryJournal::new());
        let checkpoints = Checkpoints::new(Arc::clone(&journal) as Arc<dyn StateJournal>);

        let outer = checkpoints.checkpoint().await.unwrap();
        let inner = checkpoints.checkpoint().await.unwrap();
        assert_eq!(checkpoints.depth(), 2);

        inner.revert().await.unwrap();
        outer.commit().await.unwrap();
        assert_eq!(checkpoints.depth(), 0);

        let stats = journal.stats();
        assert_eq!(stats.checkpoints_opened, stats.commits + stats.reverts);
    }
}
