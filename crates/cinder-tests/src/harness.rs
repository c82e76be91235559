//! Test harness for integration tests.
//!
//! Provides a scripted execution engine, a sequential block factory, and a
//! shared context wiring a miner to fresh collaborators.

use alloy_primitives::B256;
use async_trait::async_trait;
use cinder_miner::{
    Block, BlockFactory, BlockHeader, ExecutionResult, Miner, MinerConfig, Vm, VmError,
};
use cinder_pool::{Executables, PooledTransaction};
use cinder_state::{MemoryJournal, StateJournal};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A scripted [`Vm`]: by default every transaction succeeds consuming its
/// gas allowance; individual hashes can be given an explicit gas usage or
/// marked as always failing, and a delay can hold every run open so tests
/// can interleave work with a build in flight.
#[derive(Default)]
pub struct ScriptedVm {
    gas_used: Mutex<HashMap<B256, u64>>,
    failing: Mutex<HashMap<B256, String>>,
    delay: Mutex<Option<Duration>>,
    executed: Mutex<Vec<B256>>,
}

impl ScriptedVm {
    /// A vm with no scripted behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `gas_used` for this transaction instead of its allowance.
    pub fn set_gas_used(&self, hash: B256, gas_used: u64) {
        self.gas_used.lock().insert(hash, gas_used);
    }

    /// Make this transaction fail with the given engine message.
    pub fn fail(&self, hash: B256, message: impl Into<String>) {
        self.failing.lock().insert(hash, message.into());
    }

    /// Hold every execution open for `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Hashes in the order the engine saw them.
    pub fn executed(&self) -> Vec<B256> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl Vm for ScriptedVm {
    async fn run_tx(
        &self,
        tx: &Arc<PooledTransaction>,
        _block: &Block,
    ) -> Result<ExecutionResult, VmError> {
        let hash = tx.hash();
        self.executed.lock().push(hash);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failing.lock().get(&hash) {
            return Err(VmError::new(message.clone()));
        }
        let gas_used = self
            .gas_used
            .lock()
            .get(&hash)
            .copied()
            .unwrap_or(tx.gas_limit);
        Ok(ExecutionResult::success(gas_used))
    }
}

/// Chains blocks one after another: child number, hash, and timestamp all
/// derive from the parent.
pub struct SequentialBlocks;

impl BlockFactory for SequentialBlocks {
    fn create_block(&self, parent: &Block) -> Block {
        Block::new(BlockHeader {
            number: parent.header.number + 1,
            parent_hash: parent.hash(),
            timestamp: parent.header.timestamp + 1,
            gas_limit: parent.header.gas_limit,
        })
    }
}

/// Shared resources for miner integration tests.
pub struct TestContext {
    /// The live pool view.
    pub executables: Arc<Executables>,
    /// The journal backing the miner's checkpoints.
    pub journal: Arc<MemoryJournal>,
    /// The scripted execution engine.
    pub vm: Arc<ScriptedVm>,
    /// The miner under test.
    pub miner: Arc<Miner>,
}

impl TestContext {
    /// A context with the default miner configuration.
    pub fn new() -> Self {
        Self::with_config(MinerConfig::default())
    }

    /// A context with an explicit miner configuration.
    pub fn with_config(config: MinerConfig) -> Self {
        let executables = Arc::new(Executables::new());
        let journal = Arc::new(MemoryJournal::new());
        let vm = Arc::new(ScriptedVm::new());
        let miner = Arc::new(Miner::new(
            config,
            Arc::clone(&executables),
            Arc::clone(&vm) as Arc<dyn Vm>,
            Arc::clone(&journal) as Arc<dyn cinder_state::StateJournal>,
            Arc::new(SequentialBlocks),
        ));
        Self {
            executables,
            journal,
            vm,
            miner,
        }
    }

    /// The block every scenario starts building on.
    pub fn genesis(&self) -> Block {
        Block::new(BlockHeader {
            number: 0,
            parent_hash: B256::ZERO,
            timestamp: 1_000,
            gas_limit: self.miner.config().block_gas_limit,
        })
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Every checkpoint the journal ever opened was closed exactly once.
pub fn assert_checkpoints_balanced(journal: &MemoryJournal) {
    assert_eq!(journal.depth(), 0, "open checkpoints left behind");
    let stats = journal.stats();
    assert_eq!(
        stats.checkpoints_opened,
        stats.commits + stats.reverts,
        "checkpoint pairing broken"
    );
}

/// Poll a condition until it holds, panicking after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
