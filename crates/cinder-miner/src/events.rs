//! Miner event surface.

use crate::BlockArtifact;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A consumer of sealed blocks that may run asynchronous work inline.
///
/// Under legacy instamine the miner awaits every sink before moving to the
/// next block, giving consumers back-pressure over block production.
#[async_trait]
pub trait BlockSink: Send + Sync {
    /// Handle a sealed block.
    async fn on_block(&self, block: Arc<BlockArtifact>);
}

/// Typed subscription surface for the miner's two event kinds.
pub struct MinerEvents {
    blocks: broadcast::Sender<Arc<BlockArtifact>>,
    idle: broadcast::Sender<()>,
    sinks: RwLock<Vec<Arc<dyn BlockSink>>>,
}

impl Default for MinerEvents {
    fn default() -> Self {
        let (blocks, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (idle, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            blocks,
            idle,
            sinks: RwLock::new(Vec::new()),
        }
    }
}

impl MinerEvents {
    /// Create the event surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to sealed blocks.
    pub fn subscribe_blocks(&self) -> broadcast::Receiver<Arc<BlockArtifact>> {
        self.blocks.subscribe()
    }

    /// Subscribe to idle notifications, fired whenever the miner goes
    /// quiescent.
    pub fn subscribe_idle(&self) -> broadcast::Receiver<()> {
        self.idle.subscribe()
    }

    /// Register a block sink.
    pub fn register_sink(&self, sink: Arc<dyn BlockSink>) {
        self.sinks.write().push(sink);
    }

    /// Emit a sealed block. With `wait_for_sinks` the registered sinks are
    /// awaited in registration order; otherwise they run detached.
    /// Subscribers that lagged or went away are ignored.
    pub(crate) async fn emit_block(&self, artifact: Arc<BlockArtifact>, wait_for_sinks: bool) {
        let _ = self.blocks.send(Arc::clone(&artifact));
        let sinks = self.sinks.read().clone();
        if wait_for_sinks {
            for sink in sinks {
                sink.on_block(Arc::clone(&artifact)).await;
            }
        } else {
            for sink in sinks {
                let artifact = Arc::clone(&artifact);
                tokio::spawn(async move { sink.on_block(artifact).await });
            }
        }
    }

    /// Emit an idle notification.
    pub(crate) fn emit_idle(&self) {
        let _ = self.idle.send(());
    }
}
