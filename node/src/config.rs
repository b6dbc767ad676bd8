//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use corvid_types::NetworkId;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a Corvid node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Network this node belongs to. STATUS messages from other networks are ignored.
    #[serde(default = "default_network_id")]
    pub network_id: NetworkId,

    /// Maximum number of blocks held while waiting for their parent.
    #[serde(default = "default_max_orphans")]
    pub max_orphans: usize,

    /// Orphans older than this many seconds are dropped.
    #[serde(default = "default_orphan_expiry_secs")]
    pub orphan_expiry_secs: u64,

    /// Seconds between maintenance passes (orphan pruning, gauge refresh).
    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,

    /// Capacity of the inbound message queue.
    #[serde(default = "default_queue_capacity")]
    pub inbound_queue_capacity: usize,

    /// Capacity of the outbound message queue.
    #[serde(default = "default_queue_capacity")]
    pub outbound_queue_capacity: usize,

    /// Most block requests issued for a single STATUS announcement.
    /// Must not exceed `outbound_queue_capacity`.
    #[serde(default = "default_max_sync_requests")]
    pub max_sync_requests: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network_id() -> NetworkId {
    NetworkId::MAIN
}

fn default_max_orphans() -> usize {
    65_536
}

fn default_orphan_expiry_secs() -> u64 {
    3_600
}

fn default_maintenance_interval_secs() -> u64 {
    60
}

fn default_queue_capacity() -> usize {
    1_024
}

fn default_max_sync_requests() -> u64 {
    512
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// The parsed [`LogFormat`].
    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.inbound_queue_capacity == 0 || self.outbound_queue_capacity == 0 {
            return Err(NodeError::Config("queue capacities must be non-zero".into()));
        }
        if self.maintenance_interval_secs == 0 {
            return Err(NodeError::Config(
                "maintenance_interval_secs must be non-zero".into(),
            ));
        }
        if self.max_sync_requests == 0 {
            return Err(NodeError::Config("max_sync_requests must be non-zero".into()));
        }
        if self.max_sync_requests > self.outbound_queue_capacity as u64 {
            return Err(NodeError::Config(format!(
                "max_sync_requests ({}) exceeds outbound_queue_capacity ({})",
                self.max_sync_requests, self.outbound_queue_capacity
            )));
        }
        self.log_format()?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network_id: default_network_id(),
            max_orphans: default_max_orphans(),
            orphan_expiry_secs: default_orphan_expiry_secs(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
            inbound_queue_capacity: default_queue_capacity(),
            outbound_queue_capacity: default_queue_capacity(),
            max_sync_requests: default_max_sync_requests(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}
