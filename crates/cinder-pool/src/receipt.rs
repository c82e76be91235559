//! Execution results and receipt encoding.

use crate::PooledTransaction;
use alloy_primitives::{Bloom, Bytes, Log};
use alloy_rlp::{Encodable, RlpEncodable};

/// Outcome of running a transaction through the execution engine.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Gas consumed by the run.
    pub gas_used: u64,
    /// Whether execution completed without reverting.
    pub success: bool,
    /// Bloom filter over the emitted logs.
    pub bloom: Bloom,
    /// Emitted logs.
    pub logs: Vec<Log>,
    /// Return data.
    pub return_value: Bytes,
}

impl ExecutionResult {
    /// A successful run with no logs.
    pub fn success(gas_used: u64) -> Self {
        Self {
            gas_used,
            success: true,
            ..Default::default()
        }
    }

    /// A successful run carrying logs; the bloom is accrued from them.
    pub fn with_logs(gas_used: u64, logs: Vec<Log>) -> Self {
        let mut bloom = Bloom::default();
        for log in &logs {
            bloom.accrue_log(log);
        }
        Self {
            gas_used,
            success: true,
            bloom,
            logs,
            return_value: Bytes::new(),
        }
    }
}

/// Transaction receipt, RLP-encoded into the block's receipt trie.
#[derive(Debug, Clone, RlpEncodable)]
pub struct Receipt {
    /// Execution status.
    pub success: bool,
    /// Gas used by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Bloom filter over this receipt's logs.
    pub bloom: Bloom,
    /// Logs emitted by the transaction.
    pub logs: Vec<Log>,
}

impl PooledTransaction {
    /// Produce the receipt bytes for this transaction given its execution
    /// result and the block's cumulative gas after it.
    pub fn build_receipt(&self, result: &ExecutionResult, cumulative_gas_used: u64) -> Bytes {
        let receipt = Receipt {
            success: result.success,
            cumulative_gas_used,
            bloom: result.bloom,
            logs: result.logs.clone(),
        };
        let mut out = Vec::new();
        receipt.encode(&mut out);
        out.into()
    }
}
