use proptest::prelude::*;

use corvid_ledger::{Block, ChainStore};
use corvid_types::{Address, BlockHash, Difficulty, Hash, Timestamp};

fn genesis() -> Block {
    Block::new(
        0,
        BlockHash::ZERO,
        Vec::new(),
        Vec::new(),
        Hash::ZERO,
        Timestamp::new(0),
        Address::ZERO,
        Difficulty::ONE,
    )
}

fn child(parent: &Block, difficulty: u64, salt: u64) -> Block {
    let mut coinbase = [0u8; 20];
    coinbase[..8].copy_from_slice(&salt.to_be_bytes());
    Block::new(
        parent.number() + 1,
        parent.hash(),
        Vec::new(),
        Vec::new(),
        Hash::ZERO,
        Timestamp::new(parent.timestamp().as_secs() + 1),
        Address::new(coinbase),
        Difficulty::from_u64(difficulty),
    )
}

/// Builds a random block tree: entry `i` names the parent (index into the
/// blocks built so far, genesis is 0) and the difficulty of block `i + 1`.
fn build_tree(shape: &[(usize, u64)]) -> Vec<Block> {
    let mut blocks = vec![genesis()];
    for (i, (parent, difficulty)) in shape.iter().enumerate() {
        let parent = &blocks[parent % blocks.len()];
        let block = child(parent, *difficulty, i as u64);
        blocks.push(block);
    }
    blocks
}

proptest! {
    /// Of two siblings with different weight, the heavier is best whatever the arrival order.
    #[test]
    fn heavier_sibling_wins(a in 1u64..1_000, b in 1u64..1_000, swap in any::<bool>()) {
        prop_assume!(a != b);
        let genesis = genesis();
        let first = child(&genesis, a, 1);
        let second = child(&genesis, b, 2);
        let heavier = if a > b { first.clone() } else { second.clone() };

        let mut store = ChainStore::new();
        store.connect_block(genesis);
        if swap {
            store.connect_block(second);
            store.connect_block(first);
        } else {
            store.connect_block(first);
            store.connect_block(second);
        }
        prop_assert_eq!(store.best_block(), Some(&heavier));
    }

    /// After any sequence of connects the head carries the maximum cumulative
    /// weight, and the canonical index walks from the head back to genesis.
    #[test]
    fn head_is_heaviest_and_index_is_consistent(
        shape in prop::collection::vec((0usize..64, 1u64..5), 1..40)
    ) {
        let blocks = build_tree(&shape);
        let mut store = ChainStore::new();
        for block in &blocks {
            prop_assert!(store.connect_block(block.clone()).is_accepted());
        }

        let max_weight = blocks
            .iter()
            .filter_map(|b| store.total_weight(&b.hash()))
            .max()
            .unwrap();
        prop_assert_eq!(store.best_weight(), Some(max_weight));

        let best = store.best_block().unwrap().clone();
        let mut cursor = Some(best.clone());
        let mut walked = 0u64;
        while let Some(block) = cursor {
            prop_assert_eq!(store.block_by_number(block.number()), Some(&block));
            walked += 1;
            cursor = if block.is_genesis() {
                None
            } else {
                store.block_by_hash(&block.parent_hash()).cloned()
            };
        }
        prop_assert_eq!(walked, best.number() + 1);
        prop_assert!(store.block_by_number(best.number() + 1).is_none());
    }
}
