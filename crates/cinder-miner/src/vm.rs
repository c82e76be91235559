//! Interface to the transaction-execution engine.

use crate::Block;
use async_trait::async_trait;
use cinder_pool::{ExecutionResult, PooledTransaction};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the execution engine for a transaction it refuses
/// to run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Execution failed: {message}")]
pub struct VmError {
    /// Engine-reported message.
    pub message: String,
}

impl VmError {
    /// Wrap an engine message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The execution engine the miner runs transactions through.
///
/// A thrown error means the transaction can never succeed; the miner
/// finalizes it as rejected and moves on. Gas accounting against the block
/// is the miner's job, not the engine's.
#[async_trait]
pub trait Vm: Send + Sync {
    /// Execute a transaction in the context of the block being built.
    async fn run_tx(
        &self,
        tx: &Arc<PooledTransaction>,
        block: &Block,
    ) -> Result<ExecutionResult, VmError>;
}
