//! Prometheus metrics for the Corvid node.
//!
//! The [`NodeMetrics`] struct owns a dedicated [`Registry`]; whatever serves
//! metrics can encode it into the Prometheus text exposition format with
//! [`NodeMetrics::encode`].

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
#[derive(Clone)]
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Total number of BLOCK messages handed to the block processor.
    pub blocks_processed: IntCounter,
    /// Total number of blocks stored in the chain, including cascaded orphans.
    pub blocks_connected: IntCounter,
    /// Total number of canonical chain switches that disconnected blocks.
    pub reorgs: IntCounter,
    /// Total number of TRANSACTION messages received.
    pub transactions_received: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Number of the current best block.
    pub best_block_number: IntGauge,
    /// Blocks waiting for their parent.
    pub orphan_count: IntGauge,
    /// Pending transactions.
    pub pool_size: IntGauge,
    /// Peers that have sent a STATUS.
    pub peer_count: IntGauge,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Counters
        let blocks_processed = register_int_counter_with_registry!(
            Opts::new(
                "corvid_blocks_processed_total",
                "Total blocks processed by this node"
            ),
            registry
        )?;

        let blocks_connected = register_int_counter_with_registry!(
            Opts::new(
                "corvid_blocks_connected_total",
                "Total blocks connected to the chain"
            ),
            registry
        )?;

        let reorgs = register_int_counter_with_registry!(
            Opts::new("corvid_reorgs_total", "Total chain reorganisations"),
            registry
        )?;

        let transactions_received = register_int_counter_with_registry!(
            Opts::new(
                "corvid_transactions_received_total",
                "Total transactions received"
            ),
            registry
        )?;

        // Gauges
        let best_block_number = register_int_gauge_with_registry!(
            Opts::new("corvid_best_block_number", "Number of the best block"),
            registry
        )?;

        let orphan_count = register_int_gauge_with_registry!(
            Opts::new("corvid_orphan_count", "Current number of orphan blocks"),
            registry
        )?;

        let pool_size = register_int_gauge_with_registry!(
            Opts::new("corvid_pool_size", "Current number of pending transactions"),
            registry
        )?;

        let peer_count = register_int_gauge_with_registry!(
            Opts::new("corvid_peer_count", "Current number of known peers"),
            registry
        )?;

        Ok(Self {
            registry,
            blocks_processed,
            blocks_connected,
            reorgs,
            transactions_received,
            best_block_number,
            orphan_count,
            pool_size,
            peer_count,
        })
    }

    /// Render every metric in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
