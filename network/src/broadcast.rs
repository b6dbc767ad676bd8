//! Queue-based delivery of outbound messages.
//!
//! The [`Broadcaster`] does not write to sockets. It encodes each message and
//! pushes `(recipient, message_bytes)` onto an `mpsc` channel that the
//! transport drains, so chain processing never waits on a slow peer.

use crate::NetworkError;
use corvid_messages::{encode, Message};
use corvid_types::PeerId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Who an outbound message is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// A single peer.
    Peer(PeerId),
    /// Every connected peer; the transport expands this.
    Broadcast,
}

/// A message produced by the dispatcher, not yet queued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    pub recipient: Recipient,
    pub message: Message,
}

impl Outbound {
    pub fn to_peer(peer: PeerId, message: Message) -> Self {
        Self {
            recipient: Recipient::Peer(peer),
            message,
        }
    }

    pub fn broadcast(message: Message) -> Self {
        Self {
            recipient: Recipient::Broadcast,
            message,
        }
    }
}

/// Outcome of dispatching a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Number of messages successfully queued.
    pub sent: usize,
    /// Number of messages dropped (encoding failure, channel full or closed).
    pub failed: usize,
    /// Batch positions of the dropped messages, ascending.
    pub dropped: Vec<usize>,
}

/// Queue-based sender for outbound messages.
#[derive(Clone)]
pub struct Broadcaster {
    outbound_tx: mpsc::Sender<(Recipient, Vec<u8>)>,
}

impl Broadcaster {
    /// Create a new broadcaster backed by the given outbound channel.
    pub fn new(outbound_tx: mpsc::Sender<(Recipient, Vec<u8>)>) -> Self {
        Self { outbound_tx }
    }

    /// Encode and queue one message without waiting.
    pub fn send(&self, outbound: &Outbound) -> Result<(), NetworkError> {
        let bytes = encode(&outbound.message)?;
        self.outbound_tx
            .try_send((outbound.recipient, bytes))
            .map_err(|e| match e {
                TrySendError::Full(_) => NetworkError::QueueFull,
                TrySendError::Closed(_) => NetworkError::QueueClosed,
            })
    }

    /// Queue a batch, in order. Failures are counted and logged, never fatal.
    pub fn dispatch(&self, batch: &[Outbound]) -> BroadcastResult {
        let mut result = BroadcastResult::default();
        for (index, outbound) in batch.iter().enumerate() {
            match self.send(outbound) {
                Ok(()) => result.sent += 1,
                Err(e) => {
                    tracing::warn!(
                        recipient = ?outbound.recipient,
                        msg_type = outbound.message.message_type().as_str(),
                        error = %e,
                        "dropping outbound message"
                    );
                    result.failed += 1;
                    result.dropped.push(index);
                }
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
