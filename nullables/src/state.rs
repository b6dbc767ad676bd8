//! Nullable state store: deterministic execution for testing.

use corvid_crypto::blake2b_256_multi;
use corvid_store::{ExecutionContext, StateStore, StoreError};
use corvid_transactions::Transaction;
use corvid_types::Hash;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// An in-memory [`StateStore`] that models state roots without real accounts.
///
/// Executing no transactions leaves the root unchanged; otherwise the new root
/// is Blake2b over the parent root followed by each transaction hash. Only
/// roots it has produced (or been seeded with) can be executed on, and any
/// root can be poisoned to simulate a backend fault.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStateStore {
    roots: Mutex<HashSet<Hash>>,
    poisoned: Mutex<HashSet<Hash>>,
}

impl NullStateStore {
    /// A store holding only the empty state, `Hash::ZERO`.
    pub fn new() -> Self {
        Self::with_root(Hash::ZERO)
    }

    /// A store seeded with a single initial state.
    pub fn with_root(root: Hash) -> Self {
        Self {
            roots: Mutex::new(HashSet::from([root])),
            poisoned: Mutex::new(HashSet::new()),
        }
    }

    /// Make `root` available as a parent state.
    pub fn insert_root(&self, root: Hash) {
        self.roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root);
    }

    /// Fail every execution on `root` with a backend error.
    pub fn poison(&self, root: Hash) {
        self.poisoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(root);
    }

    /// Undo [`poison`](Self::poison).
    pub fn heal(&self, root: &Hash) {
        self.poisoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(root);
    }

    pub fn contains_root(&self, root: &Hash) -> bool {
        self.roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(root)
    }

    /// The root `execute` produces for `transactions` on `parent_root`.
    pub fn expected_root(parent_root: &Hash, transactions: &[Transaction]) -> Hash {
        if transactions.is_empty() {
            return *parent_root;
        }
        let hashes: Vec<_> = transactions.iter().map(Transaction::hash).collect();
        let mut parts: Vec<&[u8]> = Vec::with_capacity(hashes.len() + 1);
        parts.push(parent_root.as_bytes());
        parts.extend(hashes.iter().map(|h| h.as_bytes().as_slice()));
        Hash::new(blake2b_256_multi(&parts))
    }
}

impl Default for NullStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for NullStateStore {
    fn execute(
        &self,
        parent_root: &Hash,
        _context: &ExecutionContext,
        transactions: &[Transaction],
    ) -> Result<Hash, StoreError> {
        if self
            .poisoned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(parent_root)
        {
            return Err(StoreError::Backend(format!("poisoned state root {parent_root}")));
        }

        let mut roots = self.roots.lock().unwrap_or_else(PoisonError::into_inner);
        if !roots.contains(parent_root) {
            return Err(StoreError::NotFound(parent_root.to_string()));
        }
        let root = Self::expected_root(parent_root, transactions);
        roots.insert(root);
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_types::{Address, Coin, Difficulty, Timestamp};

    fn context() -> ExecutionContext {
        ExecutionContext {
            number: 1,
            timestamp: Timestamp::new(1),
            coinbase: Address::ZERO,
            difficulty: Difficulty::ONE,
        }
    }

    fn transfer(nonce: u64) -> Transaction {
        Transaction::transfer(Address::new([1; 20]), Address::new([2; 20]), Coin::from_u64(1), nonce)
    }

    #[test]
    fn empty_execution_keeps_root() {
        let store = NullStateStore::new();
        assert_eq!(store.execute(&Hash::ZERO, &context(), &[]).unwrap(), Hash::ZERO);
    }

    #[test]
    fn produced_roots_become_parents() {
        let store = NullStateStore::new();
        let root = store.execute(&Hash::ZERO, &context(), &[transfer(0)]).unwrap();
        assert_ne!(root, Hash::ZERO);
        assert!(store.contains_root(&root));
        assert!(store.execute(&root, &context(), &[transfer(1)]).is_ok());
    }

    #[test]
    fn unknown_root_is_not_found() {
        let store = NullStateStore::new();
        let err = store.execute(&Hash::new([9; 32]), &context(), &[]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn poisoned_root_fails_with_backend_error() {
        let store = NullStateStore::new();
        store.poison(Hash::ZERO);
        let err = store.execute(&Hash::ZERO, &context(), &[]).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
