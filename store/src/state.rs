//! State execution trait.

use crate::StoreError;
use corvid_transactions::Transaction;
use corvid_types::{Address, Difficulty, Hash, Timestamp};
use serde::{Deserialize, Serialize};

/// Block-level values visible to transaction execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub number: u64,
    pub timestamp: Timestamp,
    pub coinbase: Address,
    pub difficulty: Difficulty,
}

/// Access to the account-state engine.
///
/// Implementations must be deterministic: the same parent root, context and
/// transactions always yield the same new root.
pub trait StateStore: Send + Sync {
    /// Execute `transactions` in order on the state rooted at `parent_root`
    /// and return the resulting state root.
    ///
    /// Fails with [`StoreError::NotFound`] if no state is held for
    /// `parent_root`, or with another variant on backend faults.
    fn execute(
        &self,
        parent_root: &Hash,
        context: &ExecutionContext,
        transactions: &[Transaction],
    ) -> Result<Hash, StoreError>;
}
