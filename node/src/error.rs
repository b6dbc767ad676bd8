use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] corvid_ledger::LedgerError),

    #[error("protocol error: {0}")]
    Protocol(#[from] corvid_messages::ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] corvid_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("{0}")]
    Other(String),
}
