//! Transactions carried by blocks and held in the pending pool.
//!
//! A transaction is an immutable value. Its identity is its hash, which is
//! derived from the content fields only: sender, receiver, value, nonce, data,
//! gas and gas price. Two byte-identical transactions are the same transaction.

use corvid_crypto::hash_transaction;
use corvid_types::{Address, Coin, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// A value transfer (optionally carrying call data) from one account to another.
#[derive(Clone, Serialize, Deserialize)]
pub struct Transaction {
    sender: Address,
    receiver: Address,
    value: Coin,
    nonce: u64,
    data: Vec<u8>,
    gas: u64,
    gas_price: Coin,
    /// Computed on first use, never serialized.
    #[serde(skip)]
    hash: OnceLock<TxHash>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sender: Address,
        receiver: Address,
        value: Coin,
        nonce: u64,
        data: Vec<u8>,
        gas: u64,
        gas_price: Coin,
    ) -> Self {
        Self {
            sender,
            receiver,
            value,
            nonce,
            data,
            gas,
            gas_price,
            hash: OnceLock::new(),
        }
    }

    /// A plain transfer with no data, zero gas and zero gas price.
    pub fn transfer(sender: Address, receiver: Address, value: Coin, nonce: u64) -> Self {
        Self::new(sender, receiver, value, nonce, Vec::new(), 0, Coin::ZERO)
    }

    /// Copy of this transaction with a different nonce (and therefore a different hash).
    pub fn with_nonce(&self, nonce: u64) -> Self {
        Self::new(
            self.sender,
            self.receiver,
            self.value,
            nonce,
            self.data.clone(),
            self.gas,
            self.gas_price,
        )
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn receiver(&self) -> &Address {
        &self.receiver
    }

    pub fn value(&self) -> Coin {
        self.value
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn gas(&self) -> u64 {
        self.gas
    }

    pub fn gas_price(&self) -> Coin {
        self.gas_price
    }

    /// The content hash of this transaction.
    pub fn hash(&self) -> TxHash {
        *self.hash.get_or_init(|| self.compute_hash())
    }

    fn compute_hash(&self) -> TxHash {
        let value = self.value.to_be_bytes();
        let nonce = self.nonce.to_be_bytes();
        let data_len = (self.data.len() as u64).to_be_bytes();
        let gas = self.gas.to_be_bytes();
        let gas_price = self.gas_price.to_be_bytes();
        hash_transaction(&[
            self.sender.as_bytes(),
            self.receiver.as_bytes(),
            &value,
            &nonce,
            &data_len,
            &self.data,
            &gas,
            &gas_price,
        ])
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Transaction {}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("hash", &self.hash())
            .field("sender", &self.sender)
            .field("nonce", &self.nonce)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new([0xA1; 20])
    }

    fn bob() -> Address {
        Address::new([0xB0; 20])
    }

    #[test]
    fn identical_content_gives_identical_hash() {
        let a = Transaction::transfer(alice(), bob(), Coin::from_u64(100), 0);
        let b = Transaction::transfer(alice(), bob(), Coin::from_u64(100), 0);
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a, b);
    }

    #[test]
    fn every_content_field_changes_the_hash() {
        let base = Transaction::new(alice(), bob(), Coin::from_u64(1), 0, vec![1], 21_000, Coin::from_u64(1));
        let variants = [
            Transaction::new(bob(), bob(), Coin::from_u64(1), 0, vec![1], 21_000, Coin::from_u64(1)),
            Transaction::new(alice(), alice(), Coin::from_u64(1), 0, vec![1], 21_000, Coin::from_u64(1)),
            Transaction::new(alice(), bob(), Coin::from_u64(2), 0, vec![1], 21_000, Coin::from_u64(1)),
            Transaction::new(alice(), bob(), Coin::from_u64(1), 1, vec![1], 21_000, Coin::from_u64(1)),
            Transaction::new(alice(), bob(), Coin::from_u64(1), 0, vec![2], 21_000, Coin::from_u64(1)),
            Transaction::new(alice(), bob(), Coin::from_u64(1), 0, vec![1], 21_001, Coin::from_u64(1)),
            Transaction::new(alice(), bob(), Coin::from_u64(1), 0, vec![1], 21_000, Coin::from_u64(2)),
        ];
        for variant in &variants {
            assert_ne!(variant.hash(), base.hash());
        }
    }

    #[test]
    fn with_nonce_keeps_other_fields() {
        let tx = Transaction::transfer(alice(), bob(), Coin::from_u64(7), 3);
        let next = tx.with_nonce(4);
        assert_eq!(next.nonce(), 4);
        assert_eq!(next.sender(), tx.sender());
        assert_eq!(next.value(), tx.value());
        assert_ne!(next.hash(), tx.hash());
    }

    #[test]
    fn hash_survives_serialization() {
        let tx = Transaction::new(alice(), bob(), Coin::from_u64(5), 9, b"call".to_vec(), 50, Coin::from_u64(2));
        let hash = tx.hash();
        let bytes = bincode::serialize(&tx).unwrap();
        let decoded: Transaction = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.hash(), hash);
        assert_eq!(decoded.data(), b"call");
    }
}
