//! Block artifact assembly: tries, bloom, and gas accounting.

use alloy_primitives::{Bloom, B256};
use alloy_trie::{HashBuilder, Nibbles, EMPTY_ROOT_HASH};
use cinder_pool::{ExecutionResult, PooledTransaction};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An index-keyed Merkle-Patricia trie accumulated while a block is built.
///
/// Entries are keyed `rlp(index)` and held in nibble order so the root can
/// be derived in a single pass when the block is sealed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedTrie {
    entries: BTreeMap<Nibbles, Vec<u8>>,
}

impl OrderedTrie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under a key.
    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) {
        self.entries.insert(Nibbles::unpack(key), value);
    }

    /// Look up a value by key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries
            .get(&Nibbles::unpack(key))
            .map(Vec::as_slice)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the trie has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The Merkle-Patricia root over the current entries.
    pub fn root(&self) -> B256 {
        if self.entries.is_empty() {
            return EMPTY_ROOT_HASH;
        }
        let mut builder = HashBuilder::default();
        for (key, value) in &self.entries {
            builder.add_leaf(key.clone(), value);
        }
        builder.root()
    }
}

/// The sealed description of a produced block.
#[derive(Debug, Clone)]
pub struct BlockArtifact {
    /// Accepted transactions, in commit order.
    pub transactions: Vec<Arc<PooledTransaction>>,
    /// Trie of `rlp(index)` to serialized transaction.
    pub transactions_trie: OrderedTrie,
    /// Trie of `rlp(index)` to receipt bytes.
    pub receipts_trie: OrderedTrie,
    /// Bloom over every receipt in the block.
    pub bloom: Bloom,
    /// Total gas consumed.
    pub gas_used: u64,
    /// Timestamp copied from the parent header input.
    pub timestamp: u64,
}

impl BlockArtifact {
    /// Root of the transactions trie.
    pub fn transactions_root(&self) -> B256 {
        self.transactions_trie.root()
    }

    /// Root of the receipts trie.
    pub fn receipts_root(&self) -> B256 {
        self.receipts_trie.root()
    }
}

/// Accumulates accepted transactions into a [`BlockArtifact`].
#[derive(Debug)]
pub struct BlockAssembler {
    transactions: Vec<Arc<PooledTransaction>>,
    transactions_trie: OrderedTrie,
    receipts_trie: OrderedTrie,
    bloom: Bloom,
    gas_used: u64,
    timestamp: u64,
}

impl BlockAssembler {
    /// Start assembling a block with the given timestamp.
    pub fn new(timestamp: u64) -> Self {
        Self {
            transactions: Vec::new(),
            transactions_trie: OrderedTrie::new(),
            receipts_trie: OrderedTrie::new(),
            bloom: Bloom::default(),
            gas_used: 0,
            timestamp,
        }
    }

    /// Append an accepted transaction: update both tries under the next
    /// index, fold the result's bloom into the block bloom, and add its
    /// gas to the running total. Returns the cumulative gas including this
    /// transaction.
    pub fn push(&mut self, tx: Arc<PooledTransaction>, result: &ExecutionResult) -> u64 {
        self.gas_used += result.gas_used;

        let index = self.transactions.len() as u64;
        let key = alloy_rlp::encode(index);
        self.transactions_trie.insert(&key, tx.serialize().to_vec());
        self.receipts_trie
            .insert(&key, tx.build_receipt(result, self.gas_used).to_vec());

        self.bloom |= result.bloom;
        self.transactions.push(tx);
        self.gas_used
    }

    /// Number of accepted transactions.
    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    /// Gas consumed so far.
    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    /// Seal the artifact.
    pub fn seal(self) -> BlockArtifact {
        BlockArtifact {
            transactions: self.transactions,
            transactions_trie: self.transactions_trie,
            receipts_trie: self.receipts_trie,
            bloom: self.bloom,
            gas_used: self.gas_used,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, LogData, U256};

    fn tx(origin: u8, nonce: u64) -> Arc<PooledTransaction> {
        Arc::new(PooledTransaction::new(
            Address::repeat_byte(origin),
            nonce,
            U256::from(10u64),
            21_000,
            Some(Address::repeat_byte(0xEE)),
            U256::from(1u64),
            Bytes::new(),
        ))
    }

    #[test]
    fn test_empty_artifact() {
        let artifact = BlockAssembler::new(1_000).seal();
        assert!(artifact.transactions.is_empty());
        assert_eq!(artifact.gas_used, 0);
        assert_eq!(artifact.transactions_root(), EMPTY_ROOT_HASH);
        assert_eq!(artifact.receipts_root(), EMPTY_ROOT_HASH);
        assert_eq!(artifact.timestamp, 1_000);
    }

    #[test]
    fn test_gas_accumulates() {
        let mut assembler = BlockAssembler::new(1_000);
        let first = assembler.push(tx(0xAA, 0), &ExecutionResult::success(21_000));
        assert_eq!(first, 21_000);
        let second = assembler.push(tx(0xBB, 0), &ExecutionResult::success(30_000));
        assert_eq!(second, 51_000);
        assert_eq!(assembler.gas_used(), 51_000);
        assert_eq!(assembler.count(), 2);
    }

    #[test]
    fn test_transactions_trie_matches_independent_build() {
        let mut assembler = BlockAssembler::new(1_000);
        let txs = [tx(0xAA, 0), tx(0xBB, 0), tx(0xCC, 0)];
        for tx in &txs {
            assembler.push(Arc::clone(tx), &ExecutionResult::success(21_000));
        }
        let artifact = assembler.seal();

        let mut independent = OrderedTrie::new();
        for (index, tx) in txs.iter().enumerate() {
            let key = alloy_rlp::encode(index as u64);
            independent.insert(&key, tx.serialize().to_vec());
        }
        assert_eq!(artifact.transactions_root(), independent.root());
        assert_ne!(artifact.transactions_root(), EMPTY_ROOT_HASH);
    }

    #[test]
    fn test_trie_root_depends_on_order() {
        let a = tx(0xAA, 0);
        let b = tx(0xBB, 0);

        let mut forward = BlockAssembler::new(0);
        forward.push(Arc::clone(&a), &ExecutionResult::success(21_000));
        forward.push(Arc::clone(&b), &ExecutionResult::success(21_000));

        let mut reversed = BlockAssembler::new(0);
        reversed.push(b, &ExecutionResult::success(21_000));
        reversed.push(a, &ExecutionResult::success(21_000));

        assert_ne!(
            forward.seal().transactions_root(),
            reversed.seal().transactions_root()
        );
    }

    #[test]
    fn test_bloom_folds_across_receipts() {
        let log = alloy_primitives::Log {
            address: Address::repeat_byte(0x01),
            data: LogData::new_unchecked(vec![], Bytes::new()),
        };
        let mut assembler = BlockAssembler::new(0);
        assembler.push(tx(0xAA, 0), &ExecutionResult::success(21_000));
        assembler.push(tx(0xBB, 0), &ExecutionResult::with_logs(30_000, vec![log.clone()]));
        let artifact = assembler.seal();

        let mut expected = Bloom::default();
        expected.accrue_log(&log);
        assert_eq!(artifact.bloom, expected);
    }
}
