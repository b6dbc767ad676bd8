//! Protocol message dispatch.
//!
//! Turns one inbound `(message, sender)` pair into the outbound messages it
//! calls for. Nothing here touches a socket: the caller hands the returned
//! [`Outbound`] list to the broadcaster once the chain lock is released.

use crate::block_processor::BlockProcessor;
use crate::tracing_spans::{message_recv_span, status_sync_span};
use crate::NodeError;
use corvid_ledger::Block;
use corvid_messages::{Message, Status};
use corvid_network::{Outbound, PeerRegistry};
use corvid_transactions::Transaction;
use corvid_types::{BlockHash, NetworkId, PeerId, Timestamp};

/// Block numbers requested per STATUS unless configured otherwise.
pub const DEFAULT_MAX_SYNC_REQUESTS: u64 = 512;

/// Dispatches protocol messages to block admission, the pool and the peer
/// registry.
pub struct MessageProcessor {
    blocks: BlockProcessor,
    peers: PeerRegistry,
    network_id: NetworkId,
    max_sync_requests: u64,
}

impl MessageProcessor {
    pub fn new(blocks: BlockProcessor, peers: PeerRegistry, network_id: NetworkId) -> Self {
        Self {
            blocks,
            peers,
            network_id,
            max_sync_requests: DEFAULT_MAX_SYNC_REQUESTS,
        }
    }

    /// Cap the block numbers one STATUS may request. Zero is treated as one.
    pub fn with_max_sync_requests(mut self, max: u64) -> Self {
        self.max_sync_requests = max.max(1);
        self
    }

    /// Handle a message; `sender` is `None` for local submissions.
    pub fn process_message(&mut self, message: Message, sender: Option<PeerId>) -> Vec<Outbound> {
        self.process_message_at(message, sender, Timestamp::now())
    }

    /// Handle a message at a given time.
    ///
    /// Faults from the state store are logged and swallowed here, so one bad
    /// block cannot stop the node from serving other messages.
    pub fn process_message_at(
        &mut self,
        message: Message,
        sender: Option<PeerId>,
        now: Timestamp,
    ) -> Vec<Outbound> {
        let msg_type = message.message_type();
        let span = message_recv_span(sender.as_ref(), msg_type.as_str());
        let _enter = span.enter();

        let result = match message {
            Message::Block(block) => self.process_block_message(block, sender, now),
            Message::Transaction(tx) => Ok(self.process_transaction_message(tx, sender)),
            Message::Status(status) => Ok(self.process_status_message(status, sender, now)),
            Message::GetBlockByHash(hash) => Ok(self.process_get_block_by_hash(&hash, sender)),
            Message::GetBlockByNumber(number) => {
                Ok(self.process_get_block_by_number(number, sender))
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(msg_type = msg_type.as_str(), error = %e, "message processing failed");
            Vec::new()
        })
    }

    fn process_block_message(
        &mut self,
        block: Block,
        sender: Option<PeerId>,
        now: Timestamp,
    ) -> Result<Vec<Outbound>, NodeError> {
        let hash = block.hash();
        let connected = self.blocks.process_block_at(block, now)?;
        if !connected.is_empty() {
            return Ok(fan_out(connected.into_iter().map(Message::Block), sender));
        }

        let Some(peer) = sender else {
            return Ok(Vec::new());
        };
        match self.blocks.unknown_ancestor_hash(&hash) {
            Some(ancestor) if ancestor != hash => {
                tracing::debug!(%ancestor, %peer, "requesting missing ancestor");
                Ok(vec![Outbound::to_peer(peer, Message::GetBlockByHash(ancestor))])
            }
            _ => Ok(Vec::new()),
        }
    }

    fn process_transaction_message(
        &mut self,
        tx: Transaction,
        sender: Option<PeerId>,
    ) -> Vec<Outbound> {
        let added = self.blocks.transactions_mut().process_transaction(tx);
        fan_out(added.into_iter().map(Message::Transaction), sender)
    }

    fn process_status_message(
        &mut self,
        status: Status,
        sender: Option<PeerId>,
        now: Timestamp,
    ) -> Vec<Outbound> {
        if status.network_id != self.network_id {
            tracing::debug!(network = %status.network_id, "status from another network ignored");
            return Vec::new();
        }
        let Some(peer) = sender else {
            return Vec::new();
        };
        let span = status_sync_span(&peer, status.best_block_number);
        let _enter = span.enter();

        let announced = self
            .peers
            .register_status(peer, status.network_id, status.best_block_number, now);

        // Everything up to our own head, or up to what was already requested
        // from this peer, needs no new request.
        let known = self
            .blocks
            .best_block_number()
            .max(self.peers.requested_through(&peer));
        let from = match known {
            None => 0,
            Some(known) => match known.checked_add(1) {
                Some(next) => next,
                None => return Vec::new(),
            },
        };
        if from > announced {
            return Vec::new();
        }
        let to = announced.min(from.saturating_add(self.max_sync_requests - 1));
        self.peers.mark_requested(&peer, to);

        tracing::debug!(from, to, announced, "requesting blocks by number");
        (from..=to)
            .map(|number| Outbound::to_peer(peer, Message::GetBlockByNumber(number)))
            .collect()
    }

    fn process_get_block_by_hash(&self, hash: &BlockHash, sender: Option<PeerId>) -> Vec<Outbound> {
        reply_with_block(self.blocks.block_by_hash(hash), sender)
    }

    fn process_get_block_by_number(&self, number: u64, sender: Option<PeerId>) -> Vec<Outbound> {
        reply_with_block(self.blocks.block_by_number(number), sender)
    }

    /// Drop everything known about a disconnected peer.
    pub fn remove_peer(&mut self, peer: &PeerId) -> bool {
        self.peers.remove_peer(peer)
    }

    /// Reopen block requests to `peer` from `first_unsent` upwards after
    /// they failed to reach the outbound queue. The next STATUS from the
    /// peer asks for them again.
    pub fn rewind_block_requests(&mut self, peer: &PeerId, first_unsent: u64) {
        self.peers.rewind_requested(peer, first_unsent);
    }

    pub fn network_id(&self) -> NetworkId {
        self.network_id
    }

    pub fn blocks(&self) -> &BlockProcessor {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockProcessor {
        &mut self.blocks
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }
}

/// First message back to the sender, the rest to everyone. Local
/// submissions have no sender, so everything is broadcast.
fn fan_out(messages: impl IntoIterator<Item = Message>, sender: Option<PeerId>) -> Vec<Outbound> {
    messages
        .into_iter()
        .enumerate()
        .map(|(index, message)| match sender {
            Some(peer) if index == 0 => Outbound::to_peer(peer, message),
            _ => Outbound::broadcast(message),
        })
        .collect()
}

fn reply_with_block(block: Option<&Block>, sender: Option<PeerId>) -> Vec<Outbound> {
    match (block, sender) {
        (Some(block), Some(peer)) => vec![Outbound::to_peer(peer, Message::Block(block.clone()))],
        _ => Vec::new(),
    }
}
