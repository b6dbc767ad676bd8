//! Canonical chain store with weighted fork choice.
//!
//! Keeps every connected block by hash (canonical and side branches alike),
//! the number → hash index of the canonical chain, and the current head.
//! A connected block becomes the head only if its cumulative weight is
//! strictly greater than the head's; on equal weight the first-seen head is
//! kept. Switching heads rewrites the canonical index from the lowest common
//! ancestor upwards and drops index entries above the new head.

use crate::block::Block;
use corvid_types::{BlockHash, Difficulty};
use std::collections::{BTreeMap, HashMap};

/// The current best block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainHead {
    pub hash: BlockHash,
    pub number: u64,
    /// Cumulative weight of the chain ending at this block.
    pub weight: Difficulty,
}

/// Canonical-chain changes caused by a new head.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reorg {
    /// Blocks that joined the canonical chain, lowest number first. Always
    /// ends with the new head.
    pub connected: Vec<Block>,
    /// Blocks that left the canonical chain, lowest number first. Empty when
    /// the new head simply extends the old one.
    pub disconnected: Vec<Block>,
}

/// Outcome of [`ChainStore::connect_block`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectResult {
    /// The block was already stored; nothing changed.
    Known,
    /// The parent is not stored (or a genesis was offered to a non-empty store).
    UnknownParent,
    /// Stored on a branch that does not outweigh the current head.
    Stored,
    /// Stored and became the new head.
    NewBest(Reorg),
}

impl ConnectResult {
    /// `true` for every outcome except [`ConnectResult::UnknownParent`].
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::UnknownParent)
    }
}

struct StoredBlock {
    block: Block,
    total_weight: Difficulty,
}

/// In-memory block store and canonical index.
pub struct ChainStore {
    blocks: HashMap<BlockHash, StoredBlock>,
    canonical: BTreeMap<u64, BlockHash>,
    best: Option<ChainHead>,
}

impl ChainStore {
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
            canonical: BTreeMap::new(),
            best: None,
        }
    }

    /// Store `block` and run fork choice.
    ///
    /// The parent must already be stored. The only exception is genesis,
    /// which is accepted when the store is empty.
    pub fn connect_block(&mut self, block: Block) -> ConnectResult {
        let hash = block.hash();
        if self.blocks.contains_key(&hash) {
            return ConnectResult::Known;
        }

        let parent_weight = if self.blocks.is_empty() && block.is_genesis() {
            Difficulty::ZERO
        } else {
            match self.blocks.get(&block.parent_hash()) {
                Some(parent) => parent.total_weight,
                None => return ConnectResult::UnknownParent,
            }
        };

        let total_weight = parent_weight + block.local_weight();
        let number = block.number();
        self.blocks.insert(
            hash,
            StoredBlock {
                block,
                total_weight,
            },
        );

        let improves = match self.best {
            Some(head) => total_weight > head.weight,
            None => true,
        };
        if !improves {
            tracing::debug!(%hash, number, weight = %total_weight, "stored side-branch block");
            return ConnectResult::Stored;
        }

        let reorg = self.switch_head(hash, number, total_weight);
        if !reorg.disconnected.is_empty() {
            tracing::info!(
                %hash,
                number,
                weight = %total_weight,
                disconnected = reorg.disconnected.len(),
                connected = reorg.connected.len(),
                "chain reorganised"
            );
        }
        ConnectResult::NewBest(reorg)
    }

    /// Make `hash` the head, rewriting the canonical index down to the
    /// lowest common ancestor with the old canonical chain.
    fn switch_head(&mut self, hash: BlockHash, number: u64, weight: Difficulty) -> Reorg {
        let mut connected = Vec::new();
        let mut ancestor: Option<u64> = None;
        let mut cursor = Some(hash);

        while let Some(current) = cursor {
            let Some(stored) = self.blocks.get(&current) else {
                break;
            };
            let block_number = stored.block.number();
            if self.canonical.get(&block_number) == Some(&current) {
                ancestor = Some(block_number);
                break;
            }
            connected.push(stored.block.clone());
            cursor = if stored.block.is_genesis() {
                None
            } else {
                Some(stored.block.parent_hash())
            };
        }
        connected.reverse();

        let first_replaced = ancestor.map_or(0, |n| n + 1);
        let removed = self.canonical.split_off(&first_replaced);
        let disconnected = removed
            .values()
            .filter_map(|h| self.blocks.get(h))
            .map(|stored| stored.block.clone())
            .collect();

        for block in &connected {
            self.canonical.insert(block.number(), block.hash());
        }
        self.best = Some(ChainHead {
            hash,
            number,
            weight,
        });

        Reorg {
            connected,
            disconnected,
        }
    }

    pub fn block_by_hash(&self, hash: &BlockHash) -> Option<&Block> {
        self.blocks.get(hash).map(|stored| &stored.block)
    }

    /// Canonical block at `number`. Side-branch blocks are only reachable by hash.
    pub fn block_by_number(&self, number: u64) -> Option<&Block> {
        self.canonical
            .get(&number)
            .and_then(|hash| self.block_by_hash(hash))
    }

    pub fn best_block(&self) -> Option<&Block> {
        self.best.and_then(|head| self.block_by_hash(&head.hash))
    }

    /// `None` until genesis is connected.
    pub fn best_block_number(&self) -> Option<u64> {
        self.best.map(|head| head.number)
    }

    pub fn best_hash(&self) -> Option<BlockHash> {
        self.best.map(|head| head.hash)
    }

    pub fn best_weight(&self) -> Option<Difficulty> {
        self.best.map(|head| head.weight)
    }

    pub fn head(&self) -> Option<ChainHead> {
        self.best
    }

    /// Cumulative weight of the chain ending at `hash`.
    pub fn total_weight(&self, hash: &BlockHash) -> Option<Difficulty> {
        self.blocks.get(hash).map(|stored| stored.total_weight)
    }

    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn is_canonical(&self, hash: &BlockHash) -> bool {
        self.blocks
            .get(hash)
            .is_some_and(|stored| self.canonical.get(&stored.block.number()) == Some(hash))
    }

    /// Number of stored blocks, including side branches.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new()
    }
}
