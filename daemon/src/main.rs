//! Corvid daemon: entry point for running a Corvid node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;

use corvid_ledger::{create_genesis_block, GenesisConfig};
use corvid_network::Broadcaster;
use corvid_node::{init_logging, Node, NodeConfig, ShutdownController};
use corvid_nullables::NullStateStore;
use corvid_types::NetworkId;

#[derive(Parser)]
#[command(name = "corvid-daemon", about = "Corvid blockchain node daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CORVID_CONFIG")]
    config: Option<PathBuf>,

    /// Numeric network identifier. STATUS messages from other networks are ignored.
    #[arg(long, env = "CORVID_NETWORK_ID")]
    network_id: Option<u32>,

    /// Log level filter, e.g. "info" or "debug,corvid_node=trace".
    #[arg(long, env = "CORVID_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CORVID_LOG_FORMAT")]
    log_format: Option<String>,

    /// Collect Prometheus metrics.
    #[arg(long, env = "CORVID_ENABLE_METRICS")]
    metrics: bool,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Node operations.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT or SIGTERM.
    Run,
}

impl Cli {
    /// File config (or defaults) with CLI flags and env vars applied on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => NodeConfig::default(),
        };

        let config = NodeConfig {
            network_id: self.network_id.map_or(base.network_id, NetworkId::new),
            log_level: self.log_level.clone().unwrap_or(base.log_level.clone()),
            log_format: self.log_format.clone().unwrap_or(base.log_format.clone()),
            enable_metrics: self.metrics || base.enable_metrics,
            ..base
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.node_config()?;
    init_logging(config.log_format()?, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    match cli.command {
        Command::Node { action } => match action {
            NodeAction::Run => run_node(config).await?,
        },
    }

    Ok(())
}

async fn run_node(config: NodeConfig) -> anyhow::Result<()> {
    let genesis_config = GenesisConfig::default();
    let genesis = create_genesis_block(&genesis_config);
    let state = Arc::new(NullStateStore::with_root(genesis_config.state_root));

    let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_queue_capacity);
    let (outbound_tx, mut outbound_rx) = mpsc::channel(config.outbound_queue_capacity);

    tracing::info!(
        network = %config.network_id,
        max_orphans = config.max_orphans,
        metrics = config.enable_metrics,
        "starting Corvid node"
    );
    let node = Arc::new(Node::new(config, state, Broadcaster::new(outbound_tx))?);
    node.init_genesis(genesis).await?;

    // No transport is attached to this binary; outbound traffic is only logged.
    let drain = tokio::spawn(async move {
        while let Some((recipient, bytes)) = outbound_rx.recv().await {
            tracing::debug!(?recipient, len = bytes.len(), "outbound message (no transport)");
        }
    });

    let shutdown = ShutdownController::new();
    let runner = {
        let node = Arc::clone(&node);
        let signal = shutdown.signal();
        tokio::spawn(async move { node.run(inbound_rx, signal).await })
    };

    let reason = shutdown.wait_for_signal().await;
    runner.await.context("node loop panicked")?;
    drop(inbound_tx);

    if let Some(metrics) = node.metrics() {
        tracing::debug!(snapshot = %metrics.encode()?, "final metrics");
    }
    if let Some(best) = node.best_block().await {
        tracing::info!(number = best.number(), hash = %best.hash(), "best block at shutdown");
    }
    drop(node);
    drain.abort();

    tracing::info!(%reason, "Corvid daemon exited cleanly");
    Ok(())
}
