//! What each peer has announced about its chain.

use corvid_types::{NetworkId, PeerId, Timestamp};
use std::collections::HashMap;

/// Last STATUS-derived knowledge about one peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerStatus {
    pub network_id: NetworkId,
    /// Highest best block number the peer has ever announced.
    pub best_block_number: u64,
    /// Highest block number requested from this peer, if any.
    pub requested_through: Option<u64>,
    pub last_seen: Timestamp,
}

/// Registry of peer chain heights.
///
/// A peer's best block number only ever increases: a lower announcement is
/// recorded as seen but does not lower the stored number.
pub struct PeerRegistry {
    peers: HashMap<PeerId, PeerStatus>,
    /// Highest number announced by any peer, per network. Survives peer removal.
    best_by_network: HashMap<NetworkId, u64>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: HashMap::new(),
            best_by_network: HashMap::new(),
        }
    }

    /// Record a STATUS announcement and return the peer's registered number.
    pub fn register_status(
        &mut self,
        peer: PeerId,
        network_id: NetworkId,
        best_block_number: u64,
        now: Timestamp,
    ) -> u64 {
        let status = self.peers.entry(peer).or_insert(PeerStatus {
            network_id,
            best_block_number,
            requested_through: None,
            last_seen: now,
        });
        status.network_id = network_id;
        status.best_block_number = status.best_block_number.max(best_block_number);
        status.last_seen = now;
        let registered = status.best_block_number;

        let network_best = self.best_by_network.entry(network_id).or_insert(registered);
        *network_best = (*network_best).max(registered);

        tracing::debug!(%peer, network = %network_id, announced = best_block_number, registered, "peer status");
        registered
    }

    /// `None` if the peer has never sent a STATUS.
    pub fn peer_best_block_number(&self, peer: &PeerId) -> Option<u64> {
        self.peers.get(peer).map(|status| status.best_block_number)
    }

    /// Highest block number already requested from `peer`.
    pub fn requested_through(&self, peer: &PeerId) -> Option<u64> {
        self.peers.get(peer).and_then(|status| status.requested_through)
    }

    /// Record that every number up to `number` has been requested from `peer`.
    /// The mark never moves down here; see [`Self::rewind_requested`].
    pub fn mark_requested(&mut self, peer: &PeerId, number: u64) {
        if let Some(status) = self.peers.get_mut(peer) {
            status.requested_through = Some(status.requested_through.map_or(number, |n| n.max(number)));
        }
    }

    /// Forget requests from `first_unsent` upwards, so they are issued again.
    pub fn rewind_requested(&mut self, peer: &PeerId, first_unsent: u64) {
        let Some(status) = self.peers.get_mut(peer) else {
            return;
        };
        if status.requested_through.is_some_and(|n| n >= first_unsent) {
            status.requested_through = first_unsent.checked_sub(1);
            tracing::debug!(%peer, first_unsent, "block requests rewound");
        }
    }

    pub fn peer_status(&self, peer: &PeerId) -> Option<&PeerStatus> {
        self.peers.get(peer)
    }

    /// Highest best block number across currently registered peers.
    pub fn best_block_number(&self) -> Option<u64> {
        self.peers.values().map(|status| status.best_block_number).max()
    }

    /// Highest number ever announced on `network`.
    pub fn network_best_block_number(&self, network: &NetworkId) -> Option<u64> {
        self.best_by_network.get(network).copied()
    }

    /// Forget a disconnected peer. Returns `true` if it was registered.
    pub fn remove_peer(&mut self, peer: &PeerId) -> bool {
        self.peers.remove(peer).is_some()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peers(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.keys()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
