//! Block-production miner.
//!
//! The miner drains a live pool of pending transactions into blocks. Each
//! build sweeps a gas-price-ordered heap holding at most one candidate per
//! origin, executes candidates under nested state checkpoints, and emits a
//! sealed [`BlockArtifact`](crate::BlockArtifact) when the sweep ends.
//! `mine` is single-entry: a call that arrives during a build is absorbed
//! into the current one instead of starting a second loop.

use crate::checkpoints::Checkpoints;
use crate::events::MinerEvents;
use crate::heap::SelectionState;
use crate::{Block, BlockAssembler, BlockFactory, MinerResult, Vm};
use alloy_primitives::U256;
use cinder_pool::{
    Executables, Finalization, PooledTransaction, RejectedExecution, TX_BASE_GAS,
};
use cinder_state::StateJournal;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, trace, warn};

/// Gas limit applied to produced blocks when none is configured.
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// Sentinel for an unbounded per-block transaction count.
pub const UNLIMITED_TRANSACTIONS: i64 = -1;

fn default_block_gas_limit() -> u64 {
    DEFAULT_BLOCK_GAS_LIMIT
}

/// Miner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Gas limit applied to every produced block.
    #[serde(default = "default_block_gas_limit")]
    pub block_gas_limit: u64,
    /// Successor blocks carry at most one transaction each.
    #[serde(default)]
    pub instamine: bool,
    /// Await block consumers inline, giving them back-pressure over
    /// block production.
    #[serde(default)]
    pub legacy_instamine: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            block_gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            instamine: false,
            legacy_instamine: false,
        }
    }
}

/// The block-production miner.
///
/// Constructed once per chain and alive for the whole session. All methods
/// take `&self`; internal state is guarded so that a paused or concurrent
/// caller can reconcile pool arrivals while a build is suspended at an
/// await point.
pub struct Miner {
    config: MinerConfig,
    executables: Arc<Executables>,
    vm: Arc<dyn Vm>,
    checkpoints: Checkpoints,
    factory: Arc<dyn BlockFactory>,
    events: MinerEvents,
    selection: Mutex<SelectionState>,
    currently_executing_price: RwLock<U256>,
    is_busy: AtomicBool,
    pending: AtomicBool,
    paused: watch::Sender<bool>,
}

impl Miner {
    /// Create a new miner over its collaborators.
    pub fn new(
        config: MinerConfig,
        executables: Arc<Executables>,
        vm: Arc<dyn Vm>,
        journal: Arc<dyn StateJournal>,
        factory: Arc<dyn BlockFactory>,
    ) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            config,
            executables,
            vm,
            checkpoints: Checkpoints::new(journal),
            factory,
            events: MinerEvents::new(),
            selection: Mutex::new(SelectionState::new()),
            currently_executing_price: RwLock::new(U256::ZERO),
            is_busy: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            paused,
        }
    }

    /// The miner's configuration.
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// The event surface (`block` and `idle` subscriptions, sinks).
    pub fn events(&self) -> &MinerEvents {
        &self.events
    }

    /// Whether a build is currently running.
    pub fn is_busy(&self) -> bool {
        self.is_busy.load(Ordering::SeqCst)
    }

    /// Whether the miner is paused.
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Assemble blocks from the pool, starting on top of `block`.
    ///
    /// Returns the transactions of the first produced block, or `None`
    /// when a build was already running (the request is then absorbed into
    /// it). `max_transactions` bounds the first block
    /// ([`UNLIMITED_TRANSACTIONS`] for no bound, `0` for an empty block);
    /// with `only_one_block` the miner stops after one block instead of
    /// draining the heap.
    #[instrument(skip(self, block), fields(parent = block.header.number))]
    pub async fn mine(
        &self,
        block: Block,
        max_transactions: i64,
        only_one_block: bool,
    ) -> MinerResult<Option<Vec<Arc<PooledTransaction>>>> {
        self.wait_if_paused().await;

        if self.is_busy.swap(true, Ordering::SeqCst) {
            debug!("build in progress, deferring");
            self.pending.store(true, Ordering::SeqCst);
            self.update_priced_heap();
            return Ok(None);
        }

        let result = self.drive(block, max_transactions, only_one_block).await;
        self.is_busy.store(false, Ordering::SeqCst);
        self.events.emit_idle();
        result.map(Some)
    }

    /// Pause block production. If a build is running, returns only once it
    /// has drained and the miner has gone idle. Idempotent.
    #[instrument(skip(self))]
    pub async fn pause(&self) {
        self.paused.send_replace(true);
        let mut idle = self.events.subscribe_idle();
        if self.is_busy.load(Ordering::SeqCst) {
            debug!("draining current build before pausing");
            let _ = idle.recv().await;
        }
        info!("miner paused");
    }

    /// Resume block production, waking any `mine` call parked on the
    /// pause flag. Idempotent.
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    async fn wait_if_paused(&self) {
        let mut paused = self.paused.subscribe();
        while *paused.borrow_and_update() {
            if paused.changed().await.is_err() {
                break;
            }
        }
    }

    /// The outer build loop: one iteration per produced block.
    async fn drive(
        &self,
        mut block: Block,
        mut max_transactions: i64,
        only_one_block: bool,
    ) -> MinerResult<Vec<Arc<PooledTransaction>>> {
        self.set_priced_heap();
        let mut first_block: Option<Vec<Arc<PooledTransaction>>> = None;

        loop {
            let accepted = self.mine_block(&block, max_transactions).await?;
            if first_block.is_none() {
                first_block = Some(accepted);
            }
            *self.currently_executing_price.write() = U256::ZERO;

            if only_one_block {
                self.reset();
                break;
            }

            // A mine request that arrived during the build re-seeds the
            // heap; otherwise only reconcile arrivals into the open slots.
            if self.pending.swap(false, Ordering::SeqCst) {
                debug!("absorbing deferred build request");
                self.set_priced_heap();
            } else {
                self.update_priced_heap();
            }

            if self.selection.lock().priced.is_empty() {
                self.reset();
                break;
            }

            block = self.factory.create_block(&block);
            max_transactions = if self.config.instamine {
                1
            } else {
                UNLIMITED_TRANSACTIONS
            };
        }

        Ok(first_block.unwrap_or_default())
    }

    /// Build a single block: sweep the priced heap, executing candidates
    /// under a transaction-level checkpoint each, inside one block-level
    /// checkpoint.
    async fn mine_block(
        &self,
        block: &Block,
        max_transactions: i64,
    ) -> MinerResult<Vec<Arc<PooledTransaction>>> {
        let mut block_gas_left = self.config.block_gas_limit;
        let mut assembler = BlockAssembler::new(block.header.timestamp);
        let mut accepted: Vec<Arc<PooledTransaction>> = Vec::new();

        let block_checkpoint = self.checkpoints.checkpoint().await?;

        if max_transactions != 0 {
            loop {
                let Some(best) = self.selection.lock().priced.peek().cloned() else {
                    break;
                };
                let origin = best.from;

                // Nonce order forbids reaching past this transaction, so
                // its origin sits out the rest of the block; smaller
                // transactions from other origins may still fit.
                if best.intrinsic_gas() > block_gas_left {
                    best.set_locked(false);
                    self.selection.lock().finish_best(&best, None);
                    trace!(%origin, block_gas_left, "intrinsic gas over budget, origin sits out");
                    continue;
                }

                *self.currently_executing_price.write() = best.gas_price;

                let tx_checkpoint = self.checkpoints.checkpoint().await?;
                let result = match self.run_tx(&best, block).await {
                    Some(result) => result,
                    None => {
                        // The engine refused it; `run_tx` already advanced
                        // the pool and finalized the transaction.
                        tx_checkpoint.revert().await?;
                        continue;
                    }
                };

                if result.gas_used > block_gas_left {
                    tx_checkpoint.revert().await?;
                    best.set_locked(false);
                    self.selection.lock().finish_best(&best, None);
                    debug!(
                        hash = %best.hash(),
                        gas_used = result.gas_used,
                        block_gas_left,
                        "transaction does not fit, leaving it pooled"
                    );
                    continue;
                }

                tx_checkpoint.commit().await?;
                let cumulative = assembler.push(Arc::clone(&best), &result);
                block_gas_left -= result.gas_used;
                accepted.push(Arc::clone(&best));
                trace!(hash = %best.hash(), gas_used = result.gas_used, cumulative, "transaction committed");

                let next = self.executables.advance(origin);
                self.executables.track_in_progress(Arc::clone(&best));
                self.watch_finalization(&best);

                // Refill this origin's slot either way so the next block
                // doesn't lose its queue, then stop if the block is full.
                self.selection.lock().finish_best(&best, next);

                let at_capacity =
                    max_transactions >= 0 && accepted.len() as i64 >= max_transactions;
                if at_capacity || block_gas_left <= TX_BASE_GAS {
                    break;
                }
            }
        }

        let artifact = Arc::new(assembler.seal());
        block_checkpoint.commit().await?;
        info!(
            transactions = accepted.len(),
            gas_used = artifact.gas_used,
            "sealed block"
        );
        self.events
            .emit_block(artifact, self.config.legacy_instamine)
            .await;
        Ok(accepted)
    }

    /// Run one transaction through the execution engine. On refusal the
    /// transaction is finalized as rejected, its origin's queue advanced,
    /// and `None` returned; the caller only reverts its checkpoint.
    async fn run_tx(
        &self,
        tx: &Arc<PooledTransaction>,
        block: &Block,
    ) -> Option<cinder_pool::ExecutionResult> {
        match self.vm.run_tx(tx, block).await {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(
                    hash = %tx.hash(),
                    origin = %tx.from,
                    error = %err,
                    "execution engine rejected transaction"
                );
                let next = self.executables.advance(tx.from);
                self.selection.lock().finish_best(tx, next);
                tx.finalize(Finalization::Rejected(RejectedExecution::new(
                    tx.hash(),
                    err.message,
                )));
                None
            }
        }
    }

    /// Drop the transaction from the in-progress set once its one-shot
    /// finalization signal fires.
    fn watch_finalization(&self, tx: &Arc<PooledTransaction>) {
        let mut finalized = tx.finalized();
        let executables = Arc::clone(&self.executables);
        let hash = tx.hash();
        tokio::spawn(async move {
            while finalized.borrow_and_update().is_none() {
                if finalized.changed().await.is_err() {
                    break;
                }
            }
            executables.untrack(hash);
        });
    }

    /// Stage every origin's unlocked queue head for selection.
    fn set_priced_heap(&self) {
        let mut selection = self.selection.lock();
        for entry in self.executables.pending().iter() {
            if let Some(head) = entry.value().peek() {
                if !head.is_locked() {
                    selection.stage(head);
                }
            }
        }
        debug!(candidates = selection.priced.len(), "seeded priced heap");
    }

    /// Absorb pool arrivals without breaking the one-slot-per-origin rule.
    /// Arrivals priced below the transaction currently being swept wait
    /// for the next seed.
    fn update_priced_heap(&self) {
        let floor = *self.currently_executing_price.read();
        let mut selection = self.selection.lock();
        for entry in self.executables.pending().iter() {
            let origin = *entry.key();
            if selection.contains_origin(&origin) {
                continue;
            }
            let Some(head) = entry.value().peek() else {
                continue;
            };
            if head.is_locked() || floor > head.gas_price {
                continue;
            }
            selection.stage(head);
        }
    }

    /// Drop all staged candidates.
    fn reset(&self) {
        self.selection.lock().clear();
    }
}
