use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state root not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("state is corrupted: {0}")]
    Corruption(String),
}
