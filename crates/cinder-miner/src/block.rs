//! Block inputs to the miner.

use alloy_primitives::{keccak256, B256};
use alloy_rlp::RlpEncodable;

/// Header of a block the miner builds on.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable)]
pub struct BlockHeader {
    /// Block number.
    pub number: u64,
    /// Hash of the parent block.
    pub parent_hash: B256,
    /// Timestamp carried into the produced artifact.
    pub timestamp: u64,
    /// Gas limit of the block.
    pub gas_limit: u64,
}

/// A block handed to the miner as the parent of the one being built.
///
/// Blocks are immutable once created; every outer selection iteration
/// receives a fresh one from the [`BlockFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The header.
    pub header: BlockHeader,
}

impl Block {
    /// Create a block from a header.
    pub fn new(header: BlockHeader) -> Self {
        Self { header }
    }

    /// Hash of the header.
    pub fn hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(&self.header))
    }
}

/// Produces the successor of a block, carrying chain context the miner
/// does not own (numbers, parent hashes, timestamps).
pub trait BlockFactory: Send + Sync {
    /// Build the block that follows `parent`.
    fn create_block(&self, parent: &Block) -> Block;
}
