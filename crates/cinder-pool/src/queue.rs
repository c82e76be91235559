//! Per-origin nonce-ordered transaction queues.

use crate::PooledTransaction;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

/// Nonce-ordered wrapper for queue membership. Lower nonces come first;
/// equal nonces fall back to the hash so the order is total.
#[derive(Debug, Clone)]
struct ByNonce(Arc<PooledTransaction>);

impl PartialEq for ByNonce {
    fn eq(&self, other: &Self) -> bool {
        self.0.hash() == other.0.hash()
    }
}

impl Eq for ByNonce {}

impl PartialOrd for ByNonce {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByNonce {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .nonce
            .cmp(&other.0.nonce)
            .then_with(|| self.0.hash().cmp(&other.0.hash()))
    }
}

/// Queue of one origin's executable transactions, ordered by nonce.
///
/// Consumers only ever see the head: the miner peeks it and removes it once
/// the transaction has been committed to a block or rejected.
#[derive(Debug, Default)]
pub struct OriginQueue {
    heap: BinaryHeap<Reverse<ByNonce>>,
}

impl OriginQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transaction.
    pub fn push(&mut self, tx: Arc<PooledTransaction>) {
        self.heap.push(Reverse(ByNonce(tx)));
    }

    /// The lowest-nonce transaction, if any.
    pub fn peek(&self) -> Option<Arc<PooledTransaction>> {
        self.heap.peek().map(|entry| Arc::clone(&entry.0 .0))
    }

    /// Remove the head. Returns whether a new head exists.
    pub fn remove_best(&mut self) -> bool {
        self.heap.pop();
        !self.heap.is_empty()
    }

    /// Whether a transaction with this nonce is already queued.
    pub fn contains_nonce(&self, nonce: u64) -> bool {
        self.heap.iter().any(|entry| entry.0 .0.nonce == nonce)
    }

    /// Number of queued transactions.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
