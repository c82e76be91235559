//! Test data generators for integration tests.
//!
//! Provides helpers to build origins and pooled transactions with the
//! shapes the miner scenarios need.

use alloy_primitives::{Address, Bytes, U256};
use cinder_pool::{PooledTransaction, TX_BASE_GAS};
use std::sync::Arc;

/// An origin address derived from a single seed byte.
pub fn origin(seed: u8) -> Address {
    Address::repeat_byte(seed)
}

/// A plain value transfer: 21k gas, empty calldata.
pub fn transfer(origin_seed: u8, nonce: u64, gas_price: u64) -> Arc<PooledTransaction> {
    tx_with_gas(origin_seed, nonce, gas_price, TX_BASE_GAS)
}

/// A transaction with an explicit gas allowance.
pub fn tx_with_gas(
    origin_seed: u8,
    nonce: u64,
    gas_price: u64,
    gas_limit: u64,
) -> Arc<PooledTransaction> {
    Arc::new(PooledTransaction::new(
        origin(origin_seed),
        nonce,
        U256::from(gas_price),
        gas_limit,
        Some(Address::repeat_byte(0xEE)),
        U256::from(1u64),
        Bytes::new(),
    ))
}

/// A transaction whose calldata pushes its intrinsic gas to roughly
/// `TX_BASE_GAS + 16 * nonzero_bytes`.
pub fn tx_with_calldata(
    origin_seed: u8,
    nonce: u64,
    gas_price: u64,
    nonzero_bytes: usize,
) -> Arc<PooledTransaction> {
    Arc::new(PooledTransaction::new(
        origin(origin_seed),
        nonce,
        U256::from(gas_price),
        1_000_000,
        Some(Address::repeat_byte(0xEE)),
        U256::ZERO,
        Bytes::from(vec![0x01; nonzero_bytes]),
    ))
}
