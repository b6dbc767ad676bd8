//! Transaction admission and pool reconciliation.

use crate::transaction_pool::TransactionPool;
use corvid_ledger::Reorg;
use corvid_transactions::Transaction;
use corvid_types::TxHash;
use std::collections::HashSet;

/// Entry point for transactions, in front of the [`TransactionPool`].
///
/// Transactions from peers go through [`process_transaction`]; canonical
/// chain changes go through [`reconcile`].
///
/// [`process_transaction`]: TransactionProcessor::process_transaction
/// [`reconcile`]: TransactionProcessor::reconcile
pub struct TransactionProcessor {
    pool: TransactionPool,
}

impl TransactionProcessor {
    pub fn new(pool: TransactionPool) -> Self {
        Self { pool }
    }

    /// Admit `tx` to the pool. Returns the transactions newly pending: `[tx]`,
    /// or empty if it was already there.
    pub fn process_transaction(&mut self, tx: Transaction) -> Vec<Transaction> {
        let hash = tx.hash();
        let added = self.pool.add_transaction(tx);
        if added.is_empty() {
            tracing::debug!(%hash, "duplicate transaction ignored");
        } else {
            tracing::debug!(%hash, pool_size = self.pool.len(), "transaction added to pool");
        }
        added
    }

    /// Bring the pool in line with a canonical chain change.
    ///
    /// Transactions of newly canonical blocks leave the pool. Transactions of
    /// blocks that left the canonical chain come back, unless the new
    /// canonical segment includes them too.
    pub fn reconcile(&mut self, reorg: &Reorg) -> Vec<Transaction> {
        let included: Vec<Transaction> = reorg
            .connected
            .iter()
            .flat_map(|block| block.transactions().iter().cloned())
            .collect();
        let included_hashes: HashSet<TxHash> = included.iter().map(Transaction::hash).collect();
        let restored: Vec<Transaction> = reorg
            .disconnected
            .iter()
            .flat_map(|block| block.transactions().iter())
            .filter(|tx| !included_hashes.contains(&tx.hash()))
            .cloned()
            .collect();

        let readded = self.pool.update_transactions(&included, &restored);
        if !readded.is_empty() {
            tracing::info!(restored = readded.len(), "displaced transactions returned to pool");
        }
        readded
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TransactionPool {
        &mut self.pool
    }
}

impl Default for TransactionProcessor {
    fn default() -> Self {
        Self::new(TransactionPool::new())
    }
}
