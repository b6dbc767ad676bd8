use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid block {hash}: {reason}")]
    InvalidBlock { hash: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] corvid_store::StoreError),
}

impl LedgerError {
    /// Whether this is a validation outcome rather than an infrastructure fault.
    pub fn is_invalid_block(&self) -> bool {
        matches!(self, Self::InvalidBlock { .. })
    }
}
