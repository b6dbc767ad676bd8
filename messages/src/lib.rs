//! Network message types for Corvid node-to-node communication.

pub mod codec;
pub mod error;

pub use codec::{decode, encode, MAX_MESSAGE_SIZE};
pub use error::ProtocolError;

use corvid_ledger::Block;
use corvid_transactions::Transaction;
use corvid_types::{BlockHash, NetworkId, PeerId};
use serde::{Deserialize, Serialize};

/// A peer's announcement of the chain it holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub peer_id: PeerId,
    pub network_id: NetworkId,
    pub best_block_number: u64,
}

/// All messages exchanged between nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    /// A full block, either announced or sent in reply to a request.
    Block(Block),
    /// A pending transaction.
    Transaction(Transaction),
    /// The sender's network and best block number.
    Status(Status),
    /// Request for the block with this hash.
    GetBlockByHash(BlockHash),
    /// Request for the canonical block at this number.
    GetBlockByNumber(u64),
}

/// Discriminant of a [`Message`], for logging and metrics labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageType {
    Block,
    Transaction,
    Status,
    GetBlockByHash,
    GetBlockByNumber,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Transaction => "transaction",
            Self::Status => "status",
            Self::GetBlockByHash => "get_block_by_hash",
            Self::GetBlockByNumber => "get_block_by_number",
        }
    }
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Block(_) => MessageType::Block,
            Self::Transaction(_) => MessageType::Transaction,
            Self::Status(_) => MessageType::Status,
            Self::GetBlockByHash(_) => MessageType::GetBlockByHash,
            Self::GetBlockByNumber(_) => MessageType::GetBlockByNumber,
        }
    }
}
