//! The Corvid node service: one writer over chain state, fed by a queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use corvid_ledger::{Block, BlockValidator};
use corvid_messages::{decode, Message, MessageType};
use corvid_network::{BroadcastResult, Broadcaster, Outbound, PeerRegistry, Recipient};
use corvid_store::StateStore;
use corvid_transactions::Transaction;
use corvid_types::{BlockHash, PeerId, Timestamp};

use crate::block_processor::BlockProcessor;
use crate::chain_event::ChainEvent;
use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::message_processor::MessageProcessor;
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownSignal;

/// A decoded message and the peer it came from (`None` for local submissions).
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub message: Message,
    pub sender: Option<PeerId>,
}

impl InboundMessage {
    pub fn from_peer(message: Message, peer: PeerId) -> Self {
        Self {
            message,
            sender: Some(peer),
        }
    }

    pub fn local(message: Message) -> Self {
        Self {
            message,
            sender: None,
        }
    }
}

/// The running node.
///
/// All chain, orphan, pool and peer state sits behind one mutex, held for
/// exactly one message at a time. Outbound messages are queued only after
/// the lock is released.
pub struct Node {
    config: NodeConfig,
    processor: Arc<Mutex<MessageProcessor>>,
    broadcaster: Broadcaster,
    metrics: Option<NodeMetrics>,
}

impl Node {
    pub fn new(
        config: NodeConfig,
        state: Arc<dyn StateStore>,
        broadcaster: Broadcaster,
    ) -> Result<Self, NodeError> {
        config.validate()?;

        let mut blocks = BlockProcessor::new(BlockValidator::new(state), config.max_orphans);
        let metrics = if config.enable_metrics {
            let metrics = NodeMetrics::new()?;
            let connected = metrics.blocks_connected.clone();
            let reorgs = metrics.reorgs.clone();
            blocks.subscribe(Box::new(move |event: &ChainEvent| match event {
                ChainEvent::BlockConnected { .. } => connected.inc(),
                ChainEvent::Reorganized { .. } => reorgs.inc(),
                _ => {}
            }));
            Some(metrics)
        } else {
            None
        };

        let processor = MessageProcessor::new(blocks, PeerRegistry::new(), config.network_id)
            .with_max_sync_requests(config.max_sync_requests);
        Ok(Self {
            config,
            processor: Arc::new(Mutex::new(processor)),
            broadcaster,
            metrics,
        })
    }

    /// Connect the genesis block. Calling it again with the same block is a no-op.
    pub async fn init_genesis(&self, genesis: Block) -> Result<(), NodeError> {
        let hash = genesis.hash();
        let mut processor = self.processor.lock().await;
        let blocks = processor.blocks_mut();
        if blocks.is_chained_block(&hash) {
            return Ok(());
        }
        if !genesis.is_genesis() {
            return Err(NodeError::Other(format!("block {hash} is not a genesis block")));
        }
        blocks.process_block(genesis)?;
        if !blocks.is_chained_block(&hash) {
            return Err(NodeError::Other(format!("genesis block {hash} was rejected")));
        }
        tracing::info!(%hash, "genesis block connected");
        Ok(())
    }

    /// Process one message and queue whatever it produces.
    pub async fn handle(&self, inbound: InboundMessage) -> BroadcastResult {
        let msg_type = inbound.message.message_type();
        self.count_inbound(msg_type);

        let outbound = {
            let mut processor = self.processor.lock().await;
            let outbound = processor.process_message(inbound.message, inbound.sender);
            self.refresh_gauges(&processor);
            outbound
        };

        let result = self.broadcaster.dispatch(&outbound);
        if !result.dropped.is_empty() {
            self.rewind_dropped_requests(&outbound, &result.dropped).await;
        }
        result
    }

    /// Reopen block numbers whose requests never made it onto the outbound
    /// queue, so the peer's next STATUS asks for them again.
    async fn rewind_dropped_requests(&self, outbound: &[Outbound], dropped: &[usize]) {
        let mut first_unsent: HashMap<PeerId, u64> = HashMap::new();
        for out in dropped.iter().filter_map(|&i| outbound.get(i)) {
            if let (Recipient::Peer(peer), Message::GetBlockByNumber(number)) =
                (&out.recipient, &out.message)
            {
                first_unsent
                    .entry(*peer)
                    .and_modify(|n| *n = (*n).min(*number))
                    .or_insert(*number);
            }
        }
        if first_unsent.is_empty() {
            return;
        }

        let mut processor = self.processor.lock().await;
        for (peer, number) in first_unsent {
            processor.rewind_block_requests(&peer, number);
        }
    }

    /// Decode a raw payload from `sender` and process it.
    ///
    /// Malformed or oversize payloads are rejected before any chain state
    /// is touched.
    pub async fn process_frame(
        &self,
        bytes: &[u8],
        sender: Option<PeerId>,
    ) -> Result<BroadcastResult, NodeError> {
        let message = decode(bytes).map_err(|e| {
            tracing::debug!(peer = ?sender, error = %e, "dropping undecodable frame");
            e
        })?;
        Ok(self.handle(InboundMessage { message, sender }).await)
    }

    /// Periodic housekeeping: prune expired orphans and refresh gauges.
    pub async fn maintain(&self, now: Timestamp) -> usize {
        let mut processor = self.processor.lock().await;
        let pruned = processor
            .blocks_mut()
            .prune_orphans(self.config.orphan_expiry_secs, now);
        self.refresh_gauges(&processor);
        pruned
    }

    /// Serve `inbound` until it closes or `shutdown` fires.
    pub async fn run(
        &self,
        mut inbound: mpsc::Receiver<InboundMessage>,
        mut shutdown: ShutdownSignal,
    ) {
        let mut maintenance =
            tokio::time::interval(Duration::from_secs(self.config.maintenance_interval_secs));
        maintenance.tick().await; // skip the immediate first tick

        tracing::info!(network = %self.config.network_id, "node loop started");
        loop {
            tokio::select! {
                biased;
                reason = shutdown.triggered() => {
                    tracing::info!(%reason, "node loop shutting down");
                    break;
                }
                next = inbound.recv() => match next {
                    Some(message) => {
                        self.handle(message).await;
                    }
                    None => {
                        tracing::info!("inbound queue closed, node loop stopping");
                        break;
                    }
                },
                _ = maintenance.tick() => {
                    self.maintain(Timestamp::now()).await;
                }
            }
        }
    }

    fn count_inbound(&self, msg_type: MessageType) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        match msg_type {
            MessageType::Block => metrics.blocks_processed.inc(),
            MessageType::Transaction => metrics.transactions_received.inc(),
            _ => {}
        }
    }

    fn refresh_gauges(&self, processor: &MessageProcessor) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        let blocks = processor.blocks();
        let best = blocks.best_block_number().map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        metrics.best_block_number.set(best);
        metrics.orphan_count.set(blocks.orphans().len() as i64);
        metrics.pool_size.set(blocks.transactions().pool().len() as i64);
        metrics.peer_count.set(processor.peers().peer_count() as i64);
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub async fn best_block(&self) -> Option<Block> {
        self.processor.lock().await.blocks().best_block().cloned()
    }

    pub async fn best_block_number(&self) -> Option<u64> {
        self.processor.lock().await.blocks().best_block_number()
    }

    pub async fn block_by_hash(&self, hash: &BlockHash) -> Option<Block> {
        self.processor.lock().await.blocks().block_by_hash(hash).cloned()
    }

    pub async fn block_by_number(&self, number: u64) -> Option<Block> {
        self.processor.lock().await.blocks().block_by_number(number).cloned()
    }

    /// Pending transactions, in arrival order.
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.processor.lock().await.blocks().transactions().pool().transactions()
    }

    /// Register a callback for best block changes. It runs with the chain
    /// lock held, so it must not call back into the node.
    pub async fn on_new_best_block<F>(&self, callback: F)
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        self.processor.lock().await.blocks_mut().on_new_best_block(callback);
    }

    /// Forget a peer whose connection closed.
    pub async fn remove_peer(&self, peer: &PeerId) -> bool {
        let mut processor = self.processor.lock().await;
        let removed = processor.remove_peer(peer);
        self.refresh_gauges(&processor);
        removed
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn metrics(&self) -> Option<&NodeMetrics> {
        self.metrics.as_ref()
    }
}
