//! Gas-price-ordered selection heap.

use alloy_primitives::Address;
use cinder_pool::PooledTransaction;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

/// Price-ordered wrapper for heap membership. Higher gas prices come
/// first; equal prices fall back to the hash so the order is total and
/// deterministic within a run.
#[derive(Debug, Clone)]
struct ByPrice(Arc<PooledTransaction>);

impl PartialEq for ByPrice {
    fn eq(&self, other: &Self) -> bool {
        self.0.hash() == other.0.hash()
    }
}

impl Eq for ByPrice {}

impl PartialOrd for ByPrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByPrice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .gas_price
            .cmp(&other.0.gas_price)
            .then_with(|| self.0.hash().cmp(&other.0.hash()))
    }
}

/// Max-heap of candidate transactions keyed on gas price.
///
/// Holds at most one transaction per origin; the caller maintains that
/// invariant by only staging pool-queue heads and refilling a committed
/// slot from the same origin. An empty heap is not an error: callers gate
/// every destructive operation on [`PricedHeap::peek`].
#[derive(Debug, Default)]
pub struct PricedHeap {
    heap: BinaryHeap<ByPrice>,
}

impl PricedHeap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the heap from a set of candidates.
    pub fn init(&mut self, candidates: Vec<Arc<PooledTransaction>>) {
        self.heap = candidates.into_iter().map(ByPrice).collect();
    }

    /// Insert a candidate.
    pub fn push(&mut self, tx: Arc<PooledTransaction>) {
        self.heap.push(ByPrice(tx));
    }

    /// The highest-priced candidate, if any.
    pub fn peek(&self) -> Option<&Arc<PooledTransaction>> {
        self.heap.peek().map(|entry| &entry.0)
    }

    /// Remove the best candidate. Returns whether a new best exists.
    pub fn remove_best(&mut self) -> bool {
        self.heap.pop();
        !self.heap.is_empty()
    }

    /// Overwrite the best candidate in place and restore heap order.
    /// Returns whether the heap is non-empty (always true after this
    /// call). Replacing the root directly keeps the operation logarithmic
    /// and the heap never transiently empty.
    pub fn replace_best(&mut self, tx: Arc<PooledTransaction>) -> bool {
        if self.heap.is_empty() {
            self.heap.push(ByPrice(tx));
        } else if let Some(mut best) = self.heap.peek_mut() {
            *best = ByPrice(tx);
        }
        true
    }

    /// Drop every candidate.
    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove a specific candidate wherever it sits. Only needed when a
    /// concurrently staged arrival displaced the root between suspension
    /// points.
    pub(crate) fn remove(&mut self, tx: &Arc<PooledTransaction>) {
        let hash = tx.hash();
        self.heap.retain(|entry| entry.0.hash() != hash);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<PooledTransaction>> {
        self.heap.iter().map(|entry| &entry.0)
    }
}

/// The heap plus the set of origins it currently represents.
///
/// The two structures move together: an origin is in `origins` exactly
/// when one of its transactions is staged in `priced`. Everything that
/// mutates one goes through here so the mirror never drifts.
#[derive(Debug, Default)]
pub(crate) struct SelectionState {
    pub(crate) priced: PricedHeap,
    pub(crate) origins: HashSet<Address>,
}

impl SelectionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether an origin already has a staged candidate.
    pub(crate) fn contains_origin(&self, origin: &Address) -> bool {
        self.origins.contains(origin)
    }

    /// Stage a pool-queue head: take its lease and record its origin.
    pub(crate) fn stage(&mut self, tx: Arc<PooledTransaction>) {
        tx.set_locked(true);
        self.origins.insert(tx.from);
        self.priced.push(tx);
    }

    /// Retire `finished` from the heap. With a `replacement` (the next
    /// transaction of the same origin) the slot is refilled in place;
    /// without one the origin leaves the selection entirely.
    ///
    /// `finished` is normally the root, in which case the refill is a
    /// single sift-down; if a concurrent arrival displaced it, the exact
    /// entry is removed instead.
    pub(crate) fn finish_best(
        &mut self,
        finished: &Arc<PooledTransaction>,
        replacement: Option<Arc<PooledTransaction>>,
    ) {
        let at_root = self
            .priced
            .peek()
            .is_some_and(|best| best.hash() == finished.hash());
        match replacement {
            Some(next) => {
                next.set_locked(true);
                if at_root {
                    self.priced.replace_best(next);
                } else {
                    self.priced.remove(finished);
                    self.priced.push(next);
                }
            }
            None => {
                if at_root {
                    self.priced.remove_best();
                } else {
                    self.priced.remove(finished);
                }
                self.origins.remove(&finished.from);
            }
        }
    }

    /// Drop every staged candidate and origin, releasing the leases so the
    /// leftovers are ordinary pool heads again.
    pub(crate) fn clear(&mut self) {
        for tx in self.priced.iter() {
            tx.set_locked(false);
        }
        self.priced.clear();
        self.origins.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, U256};

    fn tx(origin: u8, nonce: u64, gas_price: u64) -> Arc<PooledTransaction> {
        Arc::new(PooledTransaction::new(
            Address::repeat_byte(origin),
            nonce,
            U256::from(gas_price),
            21_000,
            Some(Address::repeat_byte(0xEE)),
            U256::ZERO,
            Bytes::new(),
        ))
    }

    #[test]
    fn test_highest_price_wins() {
        let mut heap = PricedHeap::new();
        heap.push(tx(0xAA, 0, 5));
        heap.push(tx(0xBB, 0, 20));
        heap.push(tx(0xCC, 0, 10));

        assert_eq!(heap.peek().unwrap().gas_price, U256::from(20u64));
        assert!(heap.remove_best());
        assert_eq!(heap.peek().unwrap().gas_price, U256::from(10u64));
        assert!(heap.remove_best());
        assert!(!heap.remove_best());
    }

    #[test]
    fn test_replace_best_sifts_down() {
        let mut heap = PricedHeap::new();
        heap.push(tx(0xAA, 0, 30));
        heap.push(tx(0xBB, 0, 20));

        // Replacing the root with a cheaper candidate lets the runner-up
        // surface
        assert!(heap.replace_best(tx(0xAA, 1, 1)));
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.peek().unwrap().gas_price, U256::from(20u64));
    }

    #[test]
    fn test_replace_best_on_empty_heap_pushes() {
        let mut heap = PricedHeap::new();
        assert!(heap.replace_best(tx(0xAA, 0, 10)));
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn test_equal_prices_are_deterministic() {
        let a = tx(0xAA, 0, 10);
        let b = tx(0xBB, 0, 10);

        let mut first = PricedHeap::new();
        first.push(Arc::clone(&a));
        first.push(Arc::clone(&b));

        let mut second = PricedHeap::new();
        second.init(vec![Arc::clone(&b), Arc::clone(&a)]);

        assert_eq!(first.peek().unwrap().hash(), second.peek().unwrap().hash());
    }

    #[test]
    fn test_stage_mirrors_origins() {
        let mut state = SelectionState::new();
        let a = tx(0xAA, 0, 10);
        let b = tx(0xBB, 0, 20);
        state.stage(Arc::clone(&a));
        state.stage(Arc::clone(&b));

        assert!(a.is_locked());
        assert!(b.is_locked());
        assert!(state.contains_origin(&a.from));
        assert!(state.contains_origin(&b.from));
        assert_eq!(state.priced.len(), 2);
    }

    #[test]
    fn test_finish_best_without_replacement_retires_origin() {
        let mut state = SelectionState::new();
        let a = tx(0xAA, 0, 10);
        state.stage(Arc::clone(&a));

        state.finish_best(&a, None);
        assert!(state.priced.is_empty());
        assert!(!state.contains_origin(&a.from));
    }

    #[test]
    fn test_finish_best_with_replacement_keeps_origin() {
        let mut state = SelectionState::new();
        let first = tx(0xAA, 0, 10);
        let second = tx(0xAA, 1, 8);
        state.stage(Arc::clone(&first));

        state.finish_best(&first, Some(Arc::clone(&second)));
        assert!(second.is_locked());
        assert!(state.contains_origin(&first.from));
        assert_eq!(state.priced.peek().unwrap().hash(), second.hash());
    }

    #[test]
    fn test_finish_best_survives_root_displacement() {
        let mut state = SelectionState::new();
        let executing = tx(0xAA, 0, 10);
        state.stage(Arc::clone(&executing));

        // A pricier arrival lands mid-execution and takes the root
        let arrival = tx(0xBB, 0, 50);
        state.stage(Arc::clone(&arrival));
        assert_eq!(state.priced.peek().unwrap().hash(), arrival.hash());

        let next = tx(0xAA, 1, 9);
        state.finish_best(&executing, Some(Arc::clone(&next)));

        // The arrival is untouched and the refilled slot is still present
        assert_eq!(state.priced.len(), 2);
        assert_eq!(state.priced.peek().unwrap().hash(), arrival.hash());
        assert!(state.contains_origin(&executing.from));
        assert!(state.contains_origin(&arrival.from));
    }
}
