//! Pooled transaction type and finalization signalling.

use crate::{TX_BASE_GAS, TX_CREATION_GAS, TX_DATA_NONZERO_GAS, TX_DATA_ZERO_GAS};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, EMPTY_STRING_CODE};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::debug;

/// Terminal outcome of a pooled transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finalization {
    /// The transaction was included in a block and persisted.
    Confirmed,
    /// The execution engine refused the transaction.
    Rejected(RejectedExecution),
}

/// Synthetic execution record for a transaction the execution engine threw
/// out. Mirrors the trace shape consumers expect from a failed run: a zero
/// program counter and an empty return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedExecution {
    /// Hash of the rejected transaction.
    pub transaction_hash: B256,
    /// Message reported by the execution engine.
    pub message: String,
    /// Program counter at failure.
    pub program_counter: u64,
    /// Return data of the failed run.
    pub return_value: Bytes,
}

impl RejectedExecution {
    /// Build the rejection record for a transaction hash and engine message.
    pub fn new(transaction_hash: B256, message: impl Into<String>) -> Self {
        Self {
            transaction_hash,
            message: message.into(),
            program_counter: 0,
            return_value: Bytes::new(),
        }
    }
}

/// A transaction held by the pool and observed live by the miner.
///
/// The `locked` flag is a lease: while set, the miner is the sole consumer
/// of this transaction and the pool will not hand it to anyone else. The
/// finalization channel fires exactly once, when a block consumer confirms
/// the transaction or the execution engine rejects it.
#[derive(Debug)]
pub struct PooledTransaction {
    /// Sender address.
    pub from: Address,
    /// Account nonce.
    pub nonce: u64,
    /// Price per unit of gas.
    pub gas_price: U256,
    /// Gas allowance for execution.
    pub gas_limit: u64,
    /// Recipient; `None` creates a contract.
    pub to: Option<Address>,
    /// Transferred value.
    pub value: U256,
    /// Calldata.
    pub input: Bytes,
    hash: B256,
    locked: AtomicBool,
    finalized: watch::Sender<Option<Finalization>>,
}

impl PooledTransaction {
    /// Create a new pooled transaction. The hash is computed once from the
    /// serialized form.
    pub fn new(
        from: Address,
        nonce: u64,
        gas_price: U256,
        gas_limit: u64,
        to: Option<Address>,
        value: U256,
        input: Bytes,
    ) -> Self {
        let (finalized, _) = watch::channel(None);
        let mut tx = Self {
            from,
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            input,
            hash: B256::ZERO,
            locked: AtomicBool::new(false),
            finalized,
        };
        tx.hash = keccak256(tx.serialize());
        tx
    }

    /// Transaction hash.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Minimum gas this transaction consumes before execution starts.
    pub fn intrinsic_gas(&self) -> u64 {
        let mut gas = TX_BASE_GAS;
        if self.to.is_none() {
            gas += TX_CREATION_GAS;
        }
        for byte in self.input.iter() {
            gas += if *byte == 0 {
                TX_DATA_ZERO_GAS
            } else {
                TX_DATA_NONZERO_GAS
            };
        }
        gas
    }

    /// RLP encoding of the transaction fields.
    pub fn serialize(&self) -> Bytes {
        let mut payload = Vec::new();
        self.nonce.encode(&mut payload);
        self.gas_price.encode(&mut payload);
        self.gas_limit.encode(&mut payload);
        match self.to {
            Some(to) => to.encode(&mut payload),
            None => payload.push(EMPTY_STRING_CODE),
        }
        self.value.encode(&mut payload);
        self.input.encode(&mut payload);

        let mut out = Vec::with_capacity(payload.len() + 4);
        alloy_rlp::Header {
            list: true,
            payload_length: payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(&payload);
        out.into()
    }

    /// Whether the miner currently holds the lease on this transaction.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Take or release the miner's lease.
    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    /// Record the terminal outcome. Only the first call has an effect.
    pub fn finalize(&self, outcome: Finalization) {
        let mut outcome = Some(outcome);
        let updated = self.finalized.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = outcome.take();
                true
            } else {
                false
            }
        });
        if !updated {
            debug!(hash = %self.hash, "transaction already finalized");
        }
    }

    /// Subscribe to the one-shot finalization signal.
    pub fn finalized(&self) -> watch::Receiver<Option<Finalization>> {
        self.finalized.subscribe()
    }

    /// The recorded outcome, if the transaction has been finalized.
    pub fn finalization(&self) -> Option<Finalization> {
        self.finalized.borrow().clone()
    }
}
