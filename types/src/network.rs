//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies which network a node (or a peer's STATUS report) belongs to.
///
/// Nodes only sync with peers that announce the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(u32);

impl NetworkId {
    /// The default network.
    pub const MAIN: Self = Self(1);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl Default for NetworkId {
    fn default() -> Self {
        Self::MAIN
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
