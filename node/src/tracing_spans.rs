//! Pre-built [`tracing::Span`] constructors for common node operations.
//!
//! Using consistent span names and field sets makes it easy to filter and
//! correlate logs for one block or one peer.

use corvid_types::{BlockHash, PeerId};
use tracing::{info_span, Span};

/// Span covering admission of a block and every orphan it releases.
pub fn block_process_span(hash: &BlockHash, number: u64) -> Span {
    info_span!("block_process", %hash, number)
}

/// Span covering the handling of a single inbound message.
pub fn message_recv_span(peer: Option<&PeerId>, msg_type: &str) -> Span {
    match peer {
        Some(peer) => info_span!("message_recv", %peer, msg_type),
        None => info_span!("message_recv", peer = "local", msg_type),
    }
}

/// Span covering the catch-up requests triggered by a peer's STATUS.
pub fn status_sync_span(peer: &PeerId, announced: u64) -> Span {
    info_span!("status_sync", %peer, announced)
}
