//! Orphan index: holds blocks whose parent is not yet known.
//!
//! When a block arrives referencing a parent we haven't stored, it is kept
//! here keyed by that parent hash. Once the parent connects, all waiting
//! blocks are drained and re-submitted to the block processor.

use corvid_ledger::Block;
use corvid_types::{BlockHash, Timestamp};
use std::collections::HashMap;

/// A block waiting for its parent to arrive.
#[derive(Clone, Debug)]
pub struct OrphanEntry {
    pub block: Block,
    /// When this entry was buffered.
    pub received_at: Timestamp,
}

/// Maps `parent_hash -> Vec<OrphanEntry>`, plus the reverse
/// `orphan_hash -> parent_hash` used for ancestor walks.
pub struct OrphanIndex {
    by_parent: HashMap<BlockHash, Vec<OrphanEntry>>,
    parents: HashMap<BlockHash, BlockHash>,
    /// Maximum total entries allowed (prevents memory exhaustion from spam).
    max_size: usize,
}

impl OrphanIndex {
    /// Create a new orphan index with the given capacity limit.
    pub fn new(max_size: usize) -> Self {
        Self {
            by_parent: HashMap::new(),
            parents: HashMap::new(),
            max_size,
        }
    }

    /// Buffer `block` under its parent hash.
    ///
    /// Returns `true` if the entry was inserted, `false` if the block is
    /// already buffered or the index is full.
    pub fn insert(&mut self, block: Block, now: Timestamp) -> bool {
        let hash = block.hash();
        if self.parents.contains_key(&hash) || self.parents.len() >= self.max_size {
            return false;
        }
        let parent = block.parent_hash();
        self.parents.insert(hash, parent);
        self.by_parent.entry(parent).or_default().push(OrphanEntry {
            block,
            received_at: now,
        });
        true
    }

    /// Drain all blocks that were waiting for `parent`, in arrival order.
    pub fn take_dependents(&mut self, parent: &BlockHash) -> Vec<Block> {
        match self.by_parent.remove(parent) {
            Some(entries) => entries
                .into_iter()
                .map(|entry| {
                    self.parents.remove(&entry.block.hash());
                    entry.block
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Remove a single buffered block, leaving its siblings in place.
    pub fn remove(&mut self, hash: &BlockHash) -> Option<Block> {
        let parent = self.parents.remove(hash)?;
        let entries = self.by_parent.get_mut(&parent)?;
        let position = entries.iter().position(|entry| entry.block.hash() == *hash)?;
        let entry = entries.remove(position);
        if entries.is_empty() {
            self.by_parent.remove(&parent);
        }
        Some(entry.block)
    }

    /// Blocks currently waiting on `parent`.
    pub fn waiting_on(&self, parent: &BlockHash) -> impl Iterator<Item = &Block> {
        self.by_parent
            .get(parent)
            .into_iter()
            .flatten()
            .map(|entry| &entry.block)
    }

    /// Whether the block with this hash is buffered.
    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.parents.contains_key(hash)
    }

    /// Parent hash of a buffered block.
    pub fn parent_of(&self, hash: &BlockHash) -> Option<BlockHash> {
        self.parents.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Remove entries older than `max_age_secs` relative to `now`.
    ///
    /// Returns the number of entries removed.
    pub fn clear_expired(&mut self, max_age_secs: u64, now: Timestamp) -> usize {
        let mut expired = Vec::new();
        self.by_parent.retain(|_parent, entries| {
            entries.retain(|entry| {
                let keep = entry.received_at.elapsed_since(now) < max_age_secs;
                if !keep {
                    expired.push(entry.block.hash());
                }
                keep
            });
            !entries.is_empty()
        });
        for hash in &expired {
            self.parents.remove(hash);
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_types::{Address, Difficulty, Hash};

    fn make_block(parent: BlockHash, salt: u8) -> Block {
        Block::new(
            1,
            parent,
            Vec::new(),
            Vec::new(),
            Hash::ZERO,
            Timestamp::new(1_000),
            Address::new([salt; 20]),
            Difficulty::ONE,
        )
    }

    #[test]
    fn insert_and_take_dependents() {
        let mut index = OrphanIndex::new(100);
        let parent = BlockHash::new([0xAA; 32]);
        let block = make_block(parent, 1);

        assert!(index.insert(block.clone(), Timestamp::new(1_000)));
        assert_eq!(index.len(), 1);
        assert!(index.contains(&block.hash()));
        assert_eq!(index.parent_of(&block.hash()), Some(parent));

        let dependents = index.take_dependents(&parent);
        assert_eq!(dependents, vec![block.clone()]);
        assert!(index.is_empty());
        assert!(!index.contains(&block.hash()));
    }

    #[test]
    fn dependents_come_back_in_arrival_order() {
        let mut index = OrphanIndex::new(100);
        let parent = BlockHash::new([0xBB; 32]);
        let b1 = make_block(parent, 1);
        let b2 = make_block(parent, 2);

        assert!(index.insert(b1.clone(), Timestamp::new(1_000)));
        assert!(index.insert(b2.clone(), Timestamp::new(1_001)));
        assert_eq!(index.waiting_on(&parent).count(), 2);

        assert_eq!(index.take_dependents(&parent), vec![b1, b2]);
        assert_eq!(index.waiting_on(&parent).count(), 0);
    }

    #[test]
    fn remove_keeps_siblings() {
        let mut index = OrphanIndex::new(100);
        let parent = BlockHash::new([0xBE; 32]);
        let b1 = make_block(parent, 1);
        let b2 = make_block(parent, 2);
        index.insert(b1.clone(), Timestamp::new(1_000));
        index.insert(b2.clone(), Timestamp::new(1_000));

        assert_eq!(index.remove(&b1.hash()), Some(b1.clone()));
        assert_eq!(index.remove(&b1.hash()), None);
        assert_eq!(index.len(), 1);
        assert_eq!(index.take_dependents(&parent), vec![b2]);
    }

    #[test]
    fn take_dependents_for_unknown_hash_returns_empty() {
        let mut index = OrphanIndex::new(100);
        assert!(index.take_dependents(&BlockHash::new([0xCC; 32])).is_empty());
    }

    #[test]
    fn same_block_is_buffered_once() {
        let mut index = OrphanIndex::new(100);
        let block = make_block(BlockHash::new([0xDD; 32]), 1);

        assert!(index.insert(block.clone(), Timestamp::new(1_000)));
        assert!(!index.insert(block, Timestamp::new(1_001)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn max_size_enforced() {
        let mut index = OrphanIndex::new(2);
        let parent = BlockHash::new([0xDD; 32]);

        assert!(index.insert(make_block(parent, 1), Timestamp::new(1_000)));
        assert!(index.insert(make_block(parent, 2), Timestamp::new(1_001)));
        assert!(!index.insert(make_block(parent, 3), Timestamp::new(1_002)));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn clear_expired_removes_old_entries() {
        let mut index = OrphanIndex::new(100);
        let parent1 = BlockHash::new([0x01; 32]);
        let parent2 = BlockHash::new([0x02; 32]);
        let old = make_block(parent1, 1);
        let fresh = make_block(parent2, 2);

        index.insert(old.clone(), Timestamp::new(100));
        index.insert(fresh.clone(), Timestamp::new(500));

        // At 700 with a 300s limit, the entry from 100 has expired and the one from 500 has not.
        assert_eq!(index.clear_expired(300, Timestamp::new(700)), 1);
        assert_eq!(index.len(), 1);
        assert!(!index.contains(&old.hash()));
        assert_eq!(index.take_dependents(&parent2), vec![fresh]);
    }

    #[test]
    fn clear_expired_removes_nothing_when_all_fresh() {
        let mut index = OrphanIndex::new(100);
        index.insert(make_block(BlockHash::new([0x03; 32]), 1), Timestamp::new(1_000));

        assert_eq!(index.clear_expired(300, Timestamp::new(1_100)), 0);
        assert_eq!(index.len(), 1);
    }
}
