//! Networking support for the Corvid node.
//!
//! Sockets and framing belong to the transport. This crate holds the parts of
//! networking the chain core owns: what each peer has told us about its chain,
//! and the queue that carries outbound messages to the transport.

pub mod broadcast;
pub mod error;
pub mod peer_registry;

pub use broadcast::{BroadcastResult, Broadcaster, Outbound, Recipient};
pub use error::NetworkError;
pub use peer_registry::{PeerRegistry, PeerStatus};
