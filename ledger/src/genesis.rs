//! Genesis block creation.
//!
//! Genesis is block number 0 with `parent_hash: BlockHash::ZERO`. It carries
//! no transactions and no uncles; its state root names the initial state the
//! state store was seeded with.

use crate::block::Block;
use corvid_types::{Address, BlockHash, Difficulty, Hash, Timestamp};
use serde::{Deserialize, Serialize};

/// Configuration for creating a genesis block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Root of the initial account state.
    pub state_root: Hash,
    pub coinbase: Address,
    pub difficulty: Difficulty,
    pub timestamp: Timestamp,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            state_root: Hash::ZERO,
            coinbase: Address::ZERO,
            difficulty: Difficulty::ONE,
            timestamp: Timestamp::EPOCH,
        }
    }
}

/// Create the genesis block for a given configuration.
pub fn create_genesis_block(config: &GenesisConfig) -> Block {
    Block::new(
        0,
        BlockHash::ZERO,
        Vec::new(),
        Vec::new(),
        config.state_root,
        config.timestamp,
        config.coinbase,
        config.difficulty,
    )
}
