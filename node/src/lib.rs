//! Corvid node core.
//!
//! The node is the single writer over chain state. It:
//! - Admits blocks, buffering orphans until their parents arrive
//! - Keeps the pending transaction pool in step with the canonical chain
//! - Tracks the best block each peer has announced
//! - Turns inbound protocol messages into outbound replies

pub mod block_processor;
pub mod chain_event;
pub mod config;
pub mod error;
pub mod logging;
pub mod message_processor;
pub mod metrics;
pub mod node;
pub mod orphans;
pub mod shutdown;
pub mod tracing_spans;
pub mod transaction_pool;
pub mod transaction_processor;

pub use block_processor::BlockProcessor;
pub use chain_event::{ChainEvent, EventBus};
pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use message_processor::MessageProcessor;
pub use metrics::NodeMetrics;
pub use node::{InboundMessage, Node};
pub use orphans::{OrphanEntry, OrphanIndex};
pub use shutdown::{ShutdownController, ShutdownReason, ShutdownSignal};
pub use transaction_pool::TransactionPool;
pub use transaction_processor::TransactionProcessor;
