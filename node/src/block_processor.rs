//! Block admission pipeline.
//!
//! Every block goes through the same stages: dedup, body check, parent
//! lookup (buffering as an orphan when the parent is unknown), state
//! validation against the parent, and finally connection to the chain store.
//! Connecting a block releases the orphans waiting on it; they are admitted
//! from a work-list in the same call, so a long orphan chain never deepens
//! the call stack.

use crate::chain_event::{ChainEvent, EventBus};
use crate::orphans::OrphanIndex;
use crate::tracing_spans::block_process_span;
use crate::transaction_processor::TransactionProcessor;
use crate::NodeError;
use corvid_ledger::{Block, BlockValidator, ChainStore, ConnectResult, LedgerError};
use corvid_types::{BlockHash, Timestamp};
use std::collections::VecDeque;

/// What happened to one block taken off the work-list.
enum Admission {
    /// Stored in the chain; its orphans can now be released.
    Connected(Block),
    /// Buffered, dropped, or already known.
    Pending,
}

/// Admits blocks into the chain and keeps the pool in step with it.
///
/// Owns the chain store, the orphan index and the transaction processor, so
/// one `&mut BlockProcessor` is all the exclusion block admission needs.
pub struct BlockProcessor {
    chain: ChainStore,
    orphans: OrphanIndex,
    validator: BlockValidator,
    transactions: TransactionProcessor,
    events: EventBus,
}

impl BlockProcessor {
    pub fn new(validator: BlockValidator, max_orphans: usize) -> Self {
        Self::with_parts(
            ChainStore::new(),
            OrphanIndex::new(max_orphans),
            validator,
            TransactionProcessor::default(),
        )
    }

    pub fn with_parts(
        chain: ChainStore,
        orphans: OrphanIndex,
        validator: BlockValidator,
        transactions: TransactionProcessor,
    ) -> Self {
        Self {
            chain,
            orphans,
            validator,
            transactions,
            events: EventBus::new(),
        }
    }

    /// Admit `block`, stamping a buffered orphan with the current time.
    pub fn process_block(&mut self, block: Block) -> Result<Vec<Block>, NodeError> {
        self.process_block_at(block, Timestamp::now())
    }

    /// Admit `block` and every orphan it releases.
    ///
    /// Returns the blocks stored by this call, `block` first when it was
    /// stored, then released orphans in the order they connected. An empty
    /// result means the block was already known, buffered, or invalid.
    ///
    /// A state store fault stops the cascade and is returned. Blocks stored
    /// before the fault stay stored, and a best block change is still
    /// announced. Released orphans not yet admitted go back into the orphan
    /// index; redelivering one retries it.
    pub fn process_block_at(&mut self, block: Block, now: Timestamp) -> Result<Vec<Block>, NodeError> {
        let span = block_process_span(&block.hash(), block.number());
        let _enter = span.enter();

        if self.chain.contains(&block.hash()) {
            tracing::debug!("block already known");
            return Ok(Vec::new());
        }

        let best_before = self.chain.best_hash();
        let mut connected = Vec::new();
        let mut queue = VecDeque::from([block]);
        let mut outcome = Ok(());

        while let Some(next) = queue.pop_front() {
            match self.admit(next, now) {
                Ok(Admission::Connected(block)) => {
                    let released = self.orphans.take_dependents(&block.hash());
                    if !released.is_empty() {
                        tracing::debug!(parent = %block.hash(), count = released.len(), "releasing orphans");
                    }
                    queue.extend(released);
                    connected.push(block);
                }
                Ok(Admission::Pending) => {}
                Err(e) => {
                    if !queue.is_empty() {
                        tracing::warn!(requeued = queue.len(), "store fault, released orphans buffered again");
                    }
                    for block in queue.drain(..) {
                        self.orphans.insert(block, now);
                    }
                    outcome = Err(e);
                    break;
                }
            }
        }

        self.announce_best_change(best_before);
        outcome.map(|()| connected)
    }

    /// Run one block through the stages. Never touches the work-list.
    fn admit(&mut self, block: Block, now: Timestamp) -> Result<Admission, NodeError> {
        let hash = block.hash();

        // Stage 1: dedup
        if self.chain.contains(&hash) {
            return Ok(Admission::Pending);
        }

        // Stage 2: body roots, needs no chain context
        if let Err(e) = self.validator.validate_body(&block) {
            self.reject(hash, &e);
            return Ok(Admission::Pending);
        }

        // Stage 3: parent lookup and state replay
        if block.is_genesis() {
            if !self.chain.is_empty() {
                tracing::debug!(%hash, "genesis offered to a non-empty chain");
                self.events.emit(&ChainEvent::BlockRejected {
                    hash,
                    reason: "chain already has a genesis".into(),
                });
                return Ok(Admission::Pending);
            }
        } else {
            let Some(parent) = self.chain.block_by_hash(&block.parent_hash()) else {
                self.queue_orphan(block, now);
                return Ok(Admission::Pending);
            };
            match self.validator.validate(&block, parent) {
                Ok(()) => {}
                Err(e @ LedgerError::InvalidBlock { .. }) => {
                    self.reject(hash, &e);
                    return Ok(Admission::Pending);
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Stage 4: fork choice and pool reconciliation
        let number = block.number();
        match self.chain.connect_block(block.clone()) {
            ConnectResult::Known | ConnectResult::UnknownParent => return Ok(Admission::Pending),
            ConnectResult::Stored => {}
            ConnectResult::NewBest(reorg) => {
                if !reorg.disconnected.is_empty() {
                    self.events.emit(&ChainEvent::Reorganized {
                        head: hash,
                        connected: reorg.connected.len(),
                        disconnected: reorg.disconnected.len(),
                    });
                }
                self.transactions.reconcile(&reorg);
            }
        }

        self.orphans.remove(&hash);
        tracing::debug!(%hash, number, "block connected");
        self.events.emit(&ChainEvent::BlockConnected { hash, number });
        Ok(Admission::Connected(block))
    }

    fn queue_orphan(&mut self, block: Block, now: Timestamp) {
        let hash = block.hash();
        let parent = block.parent_hash();
        if self.orphans.insert(block, now) {
            tracing::debug!(%hash, %parent, orphans = self.orphans.len(), "parent unknown, block buffered");
            self.events.emit(&ChainEvent::OrphanQueued { hash, parent });
        } else {
            tracing::debug!(%hash, %parent, "orphan not buffered (duplicate or index full)");
        }
    }

    fn reject(&self, hash: BlockHash, error: &LedgerError) {
        tracing::debug!(%hash, error = %error, "block rejected");
        self.events.emit(&ChainEvent::BlockRejected {
            hash,
            reason: error.to_string(),
        });
    }

    fn announce_best_change(&self, before: Option<BlockHash>) {
        if self.chain.best_hash() == before {
            return;
        }
        if let Some(best) = self.chain.best_block() {
            tracing::info!(hash = %best.hash(), number = best.number(), "new best block");
            self.events.emit(&ChainEvent::NewBestBlock {
                block: best.clone(),
            });
        }
    }

    /// The earliest ancestor of `hash` that still has to be fetched.
    ///
    /// Follows buffered orphans' parent links from `hash` until it reaches a
    /// hash with nothing buffered under it. A hash that is not an orphan is
    /// returned as is. `BlockHash::ZERO` yields `None`.
    pub fn unknown_ancestor_hash(&self, hash: &BlockHash) -> Option<BlockHash> {
        if hash.is_zero() {
            return None;
        }
        let mut current = *hash;
        while let Some(parent) = self.orphans.parent_of(&current) {
            current = parent;
        }
        Some(current)
    }

    /// Drop orphans buffered more than `max_age_secs` before `now`.
    pub fn prune_orphans(&mut self, max_age_secs: u64, now: Timestamp) -> usize {
        let removed = self.orphans.clear_expired(max_age_secs, now);
        if removed > 0 {
            tracing::debug!(removed, remaining = self.orphans.len(), "expired orphans pruned");
        }
        removed
    }

    /// Stored in the chain or buffered as an orphan.
    pub fn is_known_block(&self, hash: &BlockHash) -> bool {
        self.is_chained_block(hash) || self.is_orphan_block(hash)
    }

    pub fn is_chained_block(&self, hash: &BlockHash) -> bool {
        self.chain.contains(hash)
    }

    pub fn is_orphan_block(&self, hash: &BlockHash) -> bool {
        self.orphans.contains(hash)
    }

    pub fn best_block(&self) -> Option<&Block> {
        self.chain.best_block()
    }

    pub fn best_block_number(&self) -> Option<u64> {
        self.chain.best_block_number()
    }

    pub fn block_by_hash(&self, hash: &BlockHash) -> Option<&Block> {
        self.chain.block_by_hash(hash)
    }

    pub fn block_by_number(&self, number: u64) -> Option<&Block> {
        self.chain.block_by_number(number)
    }

    pub fn chain(&self) -> &ChainStore {
        &self.chain
    }

    pub fn orphans(&self) -> &OrphanIndex {
        &self.orphans
    }

    pub fn transactions(&self) -> &TransactionProcessor {
        &self.transactions
    }

    pub fn transactions_mut(&mut self) -> &mut TransactionProcessor {
        &mut self.transactions
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ChainEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    /// Register a callback for best block changes.
    pub fn on_new_best_block<F>(&mut self, callback: F)
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        self.events.on_new_best_block(callback);
    }
}
