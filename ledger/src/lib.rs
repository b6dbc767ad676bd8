//! Blocks and the canonical chain.
//!
//! Every connected block, canonical or not, is kept by hash. The canonical
//! chain is the one ending in the block with the greatest cumulative weight,
//! where a block's weight is its own difficulty plus that of the uncle
//! headers it includes. Height is not the fork-choice metric.

pub mod block;
pub mod chain_store;
pub mod error;
pub mod genesis;
pub mod validator;

pub use block::{transactions_root, uncles_root, Block, BlockHeader};
pub use chain_store::{ChainHead, ChainStore, ConnectResult, Reorg};
pub use error::LedgerError;
pub use genesis::{create_genesis_block, GenesisConfig};
pub use validator::BlockValidator;
