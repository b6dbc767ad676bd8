//! Events emitted during block processing for subscribers.

use corvid_ledger::Block;
use corvid_types::BlockHash;

/// Chain-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug)]
pub enum ChainEvent {
    /// The best block changed. Emitted at most once per processed block,
    /// after every cascaded orphan has been connected.
    NewBestBlock { block: Block },
    /// A block was stored in the chain, canonical or not.
    BlockConnected { hash: BlockHash, number: u64 },
    /// The canonical chain switched branches.
    Reorganized {
        head: BlockHash,
        connected: usize,
        disconnected: usize,
    },
    /// A block was buffered until its parent arrives.
    OrphanQueued { hash: BlockHash, parent: BlockHash },
    /// A block failed validation and was dropped.
    BlockRejected { hash: BlockHash, reason: String },
}

/// Synchronous fan-out event bus for chain events.
///
/// Listeners are invoked inline while the chain lock is held; keep handlers
/// fast to avoid stalling block processing.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&ChainEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&ChainEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    /// Subscribe to [`ChainEvent::NewBestBlock`] only.
    pub fn on_new_best_block<F>(&mut self, callback: F)
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        self.subscribe(Box::new(move |event: &ChainEvent| {
            if let ChainEvent::NewBestBlock { block } = event {
                callback(block);
            }
        }));
    }

    pub fn emit(&self, event: &ChainEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_ledger::{create_genesis_block, GenesisConfig};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_: &ChainEvent| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_: &ChainEvent| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&ChainEvent::BlockConnected {
            hash: BlockHash::ZERO,
            number: 0,
        });

        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&ChainEvent::BlockRejected {
            hash: BlockHash::ZERO,
            reason: "test".into(),
        });
    }

    #[test]
    fn new_best_block_listener_ignores_other_events() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();
        let genesis = create_genesis_block(&GenesisConfig::default());
        let expected = genesis.hash();

        let s = Arc::clone(&seen);
        bus.on_new_best_block(move |block| {
            assert_eq!(block.hash(), expected);
            s.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(&ChainEvent::OrphanQueued {
            hash: BlockHash::ZERO,
            parent: BlockHash::ZERO,
        });
        bus.emit(&ChainEvent::NewBestBlock { block: genesis });

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_creates_empty_bus() {
        let bus = EventBus::default();
        assert_eq!(bus.listener_count(), 0);
    }
}
