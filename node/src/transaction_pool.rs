//! Pending transaction pool.
//!
//! Transactions are grouped by sender and identified by hash; inserting a
//! transaction whose hash is already present is a no-op. Queries by sender
//! return nonce-ordered views. The pool does not judge nonce conflicts: two
//! transactions from one sender with the same nonce can coexist.

use corvid_transactions::Transaction;
use corvid_types::{Address, TxHash};
use std::collections::{HashMap, HashSet};

/// Mempool of not-yet-included transactions.
pub struct TransactionPool {
    by_hash: HashMap<TxHash, Transaction>,
    /// Insertion order, so [`TransactionPool::transactions`] is stable.
    order: Vec<TxHash>,
    by_sender: HashMap<Address, Vec<TxHash>>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self {
            by_hash: HashMap::new(),
            order: Vec::new(),
            by_sender: HashMap::new(),
        }
    }

    /// Add `tx` unless a transaction with the same hash is pending.
    ///
    /// Returns the transactions actually added: `[tx]` or empty.
    pub fn add_transaction(&mut self, tx: Transaction) -> Vec<Transaction> {
        let hash = tx.hash();
        if self.by_hash.contains_key(&hash) {
            return Vec::new();
        }
        self.order.push(hash);
        self.by_sender.entry(*tx.sender()).or_default().push(hash);
        self.by_hash.insert(hash, tx.clone());
        vec![tx]
    }

    /// Remove by hash. Returns `false` if it was not pending.
    pub fn remove_transaction(&mut self, tx: &Transaction) -> bool {
        let hash = tx.hash();
        let Some(removed) = self.by_hash.remove(&hash) else {
            return false;
        };
        self.order.retain(|h| *h != hash);
        if let Some(hashes) = self.by_sender.get_mut(removed.sender()) {
            hashes.retain(|h| *h != hash);
            if hashes.is_empty() {
                self.by_sender.remove(removed.sender());
            }
        }
        true
    }

    /// Remove every transaction in `to_remove`, then add every one in `to_add`.
    ///
    /// Returns the transactions that were newly added.
    pub fn update_transactions(
        &mut self,
        to_remove: &[Transaction],
        to_add: &[Transaction],
    ) -> Vec<Transaction> {
        for tx in to_remove {
            self.remove_transaction(tx);
        }
        to_add
            .iter()
            .flat_map(|tx| self.add_transaction(tx.clone()))
            .collect()
    }

    /// All pending transactions, in insertion order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.order
            .iter()
            .filter_map(|hash| self.by_hash.get(hash))
            .cloned()
            .collect()
    }

    /// Pending transactions from `sender`, ascending by nonce.
    pub fn transactions_with_sender(&self, sender: &Address) -> Vec<Transaction> {
        self.transactions_with_sender_from_nonce(sender, 0)
    }

    /// Pending transactions from `sender` with `nonce >= from_nonce`, ascending
    /// by nonce. Transactions sharing a nonce are all returned, in insertion order.
    pub fn transactions_with_sender_from_nonce(
        &self,
        sender: &Address,
        from_nonce: u64,
    ) -> Vec<Transaction> {
        let mut result: Vec<Transaction> = self
            .sender_transactions(sender)
            .filter(|tx| tx.nonce() >= from_nonce)
            .cloned()
            .collect();
        result.sort_by_key(Transaction::nonce);
        result
    }

    /// The first nonce at or after `from_nonce` for which no transaction from
    /// `sender` is pending.
    pub fn transaction_nonce_by_sender_from_nonce(&self, sender: &Address, from_nonce: u64) -> u64 {
        let nonces: HashSet<u64> = self.sender_transactions(sender).map(Transaction::nonce).collect();
        let mut nonce = from_nonce;
        while nonces.contains(&nonce) {
            match nonce.checked_add(1) {
                Some(next) => nonce = next,
                None => break,
            }
        }
        nonce
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    fn sender_transactions<'a>(&'a self, sender: &Address) -> impl Iterator<Item = &'a Transaction> + 'a {
        self.by_sender
            .get(sender)
            .into_iter()
            .flatten()
            .filter_map(|hash| self.by_hash.get(hash))
    }
}

impl Default for TransactionPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_types::Coin;

    fn alice() -> Address {
        Address::new([0xA1; 20])
    }

    fn bob() -> Address {
        Address::new([0xB0; 20])
    }

    fn tx_from(sender: Address, nonce: u64) -> Transaction {
        Transaction::transfer(sender, bob(), Coin::from_u64(100), nonce)
    }

    #[test]
    fn empty_pool() {
        let pool = TransactionPool::new();
        assert!(pool.transactions().is_empty());
        assert!(pool.transactions_with_sender(&alice()).is_empty());
        assert!(pool.is_empty());
    }

    #[test]
    fn add_transaction_returns_it() {
        let mut pool = TransactionPool::new();
        let tx = tx_from(alice(), 0);

        assert_eq!(pool.add_transaction(tx.clone()), vec![tx.clone()]);
        assert_eq!(pool.transactions(), vec![tx.clone()]);
        assert!(pool.contains(&tx.hash()));
    }

    #[test]
    fn adding_the_same_transaction_twice_is_a_noop() {
        let mut pool = TransactionPool::new();
        let tx = tx_from(alice(), 0);
        let copy = tx_from(alice(), 0);

        pool.add_transaction(tx.clone());
        assert!(pool.add_transaction(copy).is_empty());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.transactions(), vec![tx]);
    }

    #[test]
    fn transactions_keep_insertion_order() {
        let mut pool = TransactionPool::new();
        let txs = [tx_from(alice(), 2), tx_from(bob(), 0), tx_from(alice(), 0)];
        for tx in &txs {
            pool.add_transaction(tx.clone());
        }
        assert_eq!(pool.transactions(), txs.to_vec());
    }

    #[test]
    fn snapshot_is_not_affected_by_later_adds() {
        let mut pool = TransactionPool::new();
        let tx1 = tx_from(alice(), 0);
        pool.add_transaction(tx1.clone());

        let snapshot = pool.transactions();
        pool.add_transaction(tx_from(alice(), 1));

        assert_eq!(snapshot, vec![tx1]);
    }

    #[test]
    fn transactions_with_sender_only_returns_that_sender() {
        let mut pool = TransactionPool::new();
        let mine = tx_from(alice(), 0);
        pool.add_transaction(mine.clone());
        pool.add_transaction(tx_from(bob(), 0));

        assert_eq!(pool.transactions_with_sender(&alice()), vec![mine]);
    }

    #[test]
    fn transactions_with_sender_from_nonce_are_nonce_ordered() {
        let mut pool = TransactionPool::new();
        let tx1 = tx_from(alice(), 1);
        let tx2 = tx_from(alice(), 2);
        let tx3 = tx_from(alice(), 3);
        pool.add_transaction(tx3.clone());
        pool.add_transaction(tx1);
        pool.add_transaction(tx2.clone());

        assert_eq!(
            pool.transactions_with_sender_from_nonce(&alice(), 2),
            vec![tx2, tx3]
        );
    }

    #[test]
    fn repeated_nonces_are_all_returned() {
        let mut pool = TransactionPool::new();
        let tx2 = tx_from(alice(), 2);
        let tx2b = Transaction::transfer(alice(), alice(), Coin::from_u64(5), 2);
        let tx3 = tx_from(alice(), 3);
        pool.add_transaction(tx_from(alice(), 1));
        pool.add_transaction(tx2.clone());
        pool.add_transaction(tx3.clone());
        pool.add_transaction(tx2b.clone());

        let result = pool.transactions_with_sender_from_nonce(&alice(), 2);
        assert_eq!(result, vec![tx2, tx2b, tx3]);
    }

    #[test]
    fn add_and_remove() {
        let mut pool = TransactionPool::new();
        let tx = tx_from(alice(), 0);
        pool.add_transaction(tx.clone());

        assert!(pool.remove_transaction(&tx));
        assert!(pool.transactions().is_empty());
        assert!(pool.transactions_with_sender(&alice()).is_empty());
        assert!(!pool.remove_transaction(&tx));
    }

    #[test]
    fn removing_unknown_transaction_is_a_noop() {
        let mut pool = TransactionPool::new();
        pool.add_transaction(tx_from(alice(), 0));

        assert!(!pool.remove_transaction(&tx_from(alice(), 1)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn nonce_without_transactions_is_the_start() {
        let pool = TransactionPool::new();
        assert_eq!(pool.transaction_nonce_by_sender_from_nonce(&alice(), 42), 42);
    }

    #[test]
    fn nonce_scan_stops_at_first_gap() {
        let mut pool = TransactionPool::new();
        for nonce in [0, 1, 2, 4] {
            pool.add_transaction(tx_from(alice(), nonce));
        }

        assert_eq!(pool.transaction_nonce_by_sender_from_nonce(&alice(), 0), 3);
        assert_eq!(pool.transaction_nonce_by_sender_from_nonce(&alice(), 1), 3);
        assert_eq!(pool.transaction_nonce_by_sender_from_nonce(&alice(), 3), 3);
        assert_eq!(pool.transaction_nonce_by_sender_from_nonce(&alice(), 4), 5);
        assert_eq!(pool.transaction_nonce_by_sender_from_nonce(&alice(), 42), 42);
        assert_eq!(pool.transaction_nonce_by_sender_from_nonce(&bob(), 0), 0);
    }

    #[test]
    fn update_transactions() {
        let mut pool = TransactionPool::new();
        let tx1 = tx_from(alice(), 0);
        let tx2 = tx_from(alice(), 1);
        let all = vec![tx1.clone(), tx2.clone()];

        assert_eq!(pool.update_transactions(&[], &all), all);
        assert_eq!(pool.transactions(), all);

        pool.update_transactions(&all, &all);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&tx1.hash()));
        assert!(pool.contains(&tx2.hash()));

        pool.update_transactions(&all, &[]);
        assert!(pool.is_empty());
    }

    #[test]
    fn update_transactions_dedupes_additions() {
        let mut pool = TransactionPool::new();
        let tx = tx_from(alice(), 0);
        pool.add_transaction(tx.clone());

        let added = pool.update_transactions(&[], &[tx.clone(), tx]);
        assert!(added.is_empty());
        assert_eq!(pool.len(), 1);
    }
}
