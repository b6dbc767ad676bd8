//! Fundamental types for the Corvid node.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: hashes, addresses, amounts, difficulty, identifiers and timestamps.

pub mod address;
pub mod amount;
pub mod block;
pub mod difficulty;
pub mod hash;
pub mod network;
pub mod peer;
pub mod time;

pub use address::Address;
pub use amount::Coin;
pub use block::BlockHash;
pub use difficulty::Difficulty;
pub use hash::{Hash, TxHash};
pub use network::NetworkId;
pub use peer::PeerId;
pub use time::Timestamp;
