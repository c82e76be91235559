//! The live executable view shared between the pool and the miner.

use crate::{OriginQueue, PoolError, PoolResult, PooledTransaction};
use alloy_primitives::{Address, B256};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Snapshot of the executable view's size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Distinct origins with queued transactions.
    pub origins: usize,
    /// Total queued transactions across all origins.
    pub pending_transactions: usize,
    /// Transactions committed to a block and awaiting persistence.
    pub in_progress: usize,
}

/// The executable pair: `pending` per-origin queues plus the `in_progress`
/// set of transactions already committed to a block.
///
/// Producers append through [`Executables::submit`]; the miner only peeks
/// queue heads and advances them, holding the per-transaction `locked`
/// lease while a head is staged for selection. Both maps may be mutated by
/// producers while the miner is suspended, so consumers must re-read
/// entries at each use site rather than caching them.
#[derive(Debug, Default)]
pub struct Executables {
    pending: DashMap<Address, OriginQueue>,
    in_progress: DashMap<B256, Arc<PooledTransaction>>,
}

impl Executables {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transaction under its origin.
    #[instrument(skip(self, tx), fields(hash = %tx.hash(), origin = %tx.from))]
    pub fn submit(&self, tx: Arc<PooledTransaction>) -> PoolResult<()> {
        if tx.finalization().is_some() {
            return Err(PoolError::AlreadyFinalized(tx.hash()));
        }
        let mut queue = self.pending.entry(tx.from).or_default();
        if queue.contains_nonce(tx.nonce) {
            return Err(PoolError::NonceAlreadyQueued {
                origin: tx.from,
                nonce: tx.nonce,
            });
        }
        queue.push(tx);
        drop(queue);
        debug!("transaction queued");
        Ok(())
    }

    /// The live per-origin queues.
    pub fn pending(&self) -> &DashMap<Address, OriginQueue> {
        &self.pending
    }

    /// The head of one origin's queue.
    pub fn head(&self, origin: Address) -> Option<Arc<PooledTransaction>> {
        self.pending.get(&origin).and_then(|queue| queue.peek())
    }

    /// Remove the head of one origin's queue and return the next head.
    /// Queues left empty are dropped from the map.
    pub fn advance(&self, origin: Address) -> Option<Arc<PooledTransaction>> {
        let mut next = None;
        let mut emptied = false;
        if let Some(mut queue) = self.pending.get_mut(&origin) {
            queue.remove_best();
            next = queue.peek();
            emptied = queue.is_empty();
        }
        if emptied {
            self.pending.remove_if(&origin, |_, queue| queue.is_empty());
        }
        next
    }

    /// Record a transaction as committed to a block and awaiting
    /// persistence.
    pub fn track_in_progress(&self, tx: Arc<PooledTransaction>) {
        self.in_progress.insert(tx.hash(), tx);
    }

    /// Drop a transaction from the in-progress set once it has been
    /// finalized.
    pub fn untrack(&self, hash: B256) {
        if self.in_progress.remove(&hash).is_some() {
            debug!(%hash, "transaction left the in-progress set");
        }
    }

    /// Whether a transaction is awaiting persistence.
    pub fn is_in_progress(&self, hash: B256) -> bool {
        self.in_progress.contains_key(&hash)
    }

    /// Number of transactions awaiting persistence.
    pub fn in_progress_count(&self) -> usize {
        self.in_progress.len()
    }

    /// Total queued transactions across all origins.
    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(|entry| entry.value().len()).sum()
    }

    /// Size snapshot.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            origins: self.pending.len(),
            pending_transactions: self.pending_count(),
            in_progress: self.in_progress.len(),
        }
    }
}
