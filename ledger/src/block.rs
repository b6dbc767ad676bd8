//! Block and block header.
//!
//! A block is immutable once built. Its hash is derived from every header
//! field and memoized on first use. The header commits to the block body
//! through two roots: the transactions root (over transaction hashes, in
//! order) and the uncles root (over uncle header hashes, in order).

use corvid_crypto::{hash_block, hash_root};
use corvid_store::ExecutionContext;
use corvid_transactions::Transaction;
use corvid_types::{Address, BlockHash, Difficulty, Hash, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// The hashed part of a block.
///
/// Uncles are carried as bare headers: they add weight but their bodies are
/// never executed.
#[derive(Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    number: u64,
    parent_hash: BlockHash,
    transactions_root: Hash,
    uncles_root: Hash,
    state_root: Hash,
    timestamp: Timestamp,
    coinbase: Address,
    difficulty: Difficulty,
    #[serde(skip)]
    hash: OnceLock<BlockHash>,
}

impl BlockHeader {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: u64,
        parent_hash: BlockHash,
        transactions_root: Hash,
        uncles_root: Hash,
        state_root: Hash,
        timestamp: Timestamp,
        coinbase: Address,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            number,
            parent_hash,
            transactions_root,
            uncles_root,
            state_root,
            timestamp,
            coinbase,
            difficulty,
            hash: OnceLock::new(),
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn parent_hash(&self) -> BlockHash {
        self.parent_hash
    }

    pub fn transactions_root(&self) -> Hash {
        self.transactions_root
    }

    pub fn uncles_root(&self) -> Hash {
        self.uncles_root
    }

    pub fn state_root(&self) -> Hash {
        self.state_root
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn coinbase(&self) -> Address {
        self.coinbase
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn hash(&self) -> BlockHash {
        *self.hash.get_or_init(|| self.compute_hash())
    }

    fn compute_hash(&self) -> BlockHash {
        let number = self.number.to_be_bytes();
        let timestamp = self.timestamp.as_secs().to_be_bytes();
        let difficulty = self.difficulty.to_be_bytes();
        hash_block(&[
            &number,
            self.parent_hash.as_bytes(),
            self.transactions_root.as_bytes(),
            self.uncles_root.as_bytes(),
            self.state_root.as_bytes(),
            &timestamp,
            self.coinbase.as_bytes(),
            &difficulty,
        ])
    }
}

impl PartialEq for BlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for BlockHeader {}

impl fmt::Debug for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockHeader")
            .field("hash", &self.hash())
            .field("number", &self.number)
            .field("parent_hash", &self.parent_hash)
            .field("difficulty", &self.difficulty)
            .finish()
    }
}

/// Root over a block's transactions, in block order.
pub fn transactions_root(transactions: &[Transaction]) -> Hash {
    let hashes: Vec<_> = transactions.iter().map(Transaction::hash).collect();
    hash_root(hashes.iter().map(|h| h.as_bytes()))
}

/// Root over a block's uncle headers, in block order.
pub fn uncles_root(uncles: &[BlockHeader]) -> Hash {
    let hashes: Vec<_> = uncles.iter().map(BlockHeader::hash).collect();
    hash_root(hashes.iter().map(|h| h.as_bytes()))
}

/// A header together with its body.
#[derive(Clone, Serialize, Deserialize)]
pub struct Block {
    header: BlockHeader,
    uncles: Vec<BlockHeader>,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Build a block, computing the transactions and uncles roots from the body.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: u64,
        parent_hash: BlockHash,
        uncles: Vec<BlockHeader>,
        transactions: Vec<Transaction>,
        state_root: Hash,
        timestamp: Timestamp,
        coinbase: Address,
        difficulty: Difficulty,
    ) -> Self {
        let header = BlockHeader::new(
            number,
            parent_hash,
            transactions_root(&transactions),
            uncles_root(&uncles),
            state_root,
            timestamp,
            coinbase,
            difficulty,
        );
        Self {
            header,
            uncles,
            transactions,
        }
    }

    /// Assemble a block from an existing header and body, without checking
    /// that the header's roots match the body.
    pub fn with_header(
        header: BlockHeader,
        uncles: Vec<BlockHeader>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            header,
            uncles,
            transactions,
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn uncles(&self) -> &[BlockHeader] {
        &self.uncles
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn parent_hash(&self) -> BlockHash {
        self.header.parent_hash
    }

    pub fn state_root(&self) -> Hash {
        self.header.state_root
    }

    pub fn difficulty(&self) -> Difficulty {
        self.header.difficulty
    }

    pub fn timestamp(&self) -> Timestamp {
        self.header.timestamp
    }

    pub fn coinbase(&self) -> Address {
        self.header.coinbase
    }

    /// Genesis is block zero with no parent.
    pub fn is_genesis(&self) -> bool {
        self.header.number == 0 && self.header.parent_hash.is_zero()
    }

    /// This block's own contribution to chain weight: its difficulty plus the
    /// difficulty of every uncle it includes.
    pub fn local_weight(&self) -> Difficulty {
        self.header.difficulty + self.uncles.iter().map(BlockHeader::difficulty).sum::<Difficulty>()
    }

    /// Whether the header's transactions root matches the transactions carried.
    pub fn has_valid_transactions_root(&self) -> bool {
        self.header.transactions_root == transactions_root(&self.transactions)
    }

    /// Whether the header's uncles root matches the uncle headers carried.
    pub fn has_valid_uncles_root(&self) -> bool {
        self.header.uncles_root == uncles_root(&self.uncles)
    }

    pub fn execution_context(&self) -> ExecutionContext {
        ExecutionContext {
            number: self.header.number,
            timestamp: self.header.timestamp,
            coinbase: self.header.coinbase,
            difficulty: self.header.difficulty,
        }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Block {}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("hash", &self.hash())
            .field("number", &self.number())
            .field("parent_hash", &self.parent_hash())
            .field("transactions", &self.transactions.len())
            .field("uncles", &self.uncles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_types::Coin;

    fn sender() -> Address {
        Address::new([0x11; 20])
    }

    fn make_block(number: u64, parent: BlockHash, difficulty: u64) -> Block {
        Block::new(
            number,
            parent,
            Vec::new(),
            Vec::new(),
            Hash::ZERO,
            Timestamp::new(1_000 + number),
            Address::ZERO,
            Difficulty::from_u64(difficulty),
        )
    }

    fn make_uncle(number: u64, difficulty: u64) -> BlockHeader {
        make_block(number, BlockHash::new([0xEE; 32]), difficulty)
            .header()
            .clone()
    }

    #[test]
    fn hash_is_stable_and_nonzero() {
        let block = make_block(1, BlockHash::new([1; 32]), 1);
        assert!(!block.hash().is_zero());
        assert_eq!(block.hash(), block.hash());
        assert_eq!(block.hash(), block.clone().hash());
    }

    #[test]
    fn every_header_field_changes_the_hash() {
        let base = make_block(1, BlockHash::new([1; 32]), 1);
        assert_ne!(make_block(2, BlockHash::new([1; 32]), 1).hash(), base.hash());
        assert_ne!(make_block(1, BlockHash::new([2; 32]), 1).hash(), base.hash());
        assert_ne!(make_block(1, BlockHash::new([1; 32]), 2).hash(), base.hash());

        let other_coinbase = Block::new(
            1,
            BlockHash::new([1; 32]),
            Vec::new(),
            Vec::new(),
            Hash::ZERO,
            Timestamp::new(1_001),
            Address::new([9; 20]),
            Difficulty::ONE,
        );
        assert_ne!(other_coinbase.hash(), base.hash());
    }

    #[test]
    fn local_weight_without_uncles_is_difficulty() {
        let block = make_block(1, BlockHash::new([1; 32]), 7);
        assert_eq!(block.local_weight(), Difficulty::from_u64(7));
    }

    #[test]
    fn local_weight_adds_uncle_difficulty() {
        let block = Block::new(
            2,
            BlockHash::new([1; 32]),
            vec![make_uncle(1, 1), make_uncle(1, 4)],
            Vec::new(),
            Hash::ZERO,
            Timestamp::new(1_002),
            Address::ZERO,
            Difficulty::from_u64(2),
        );
        assert_eq!(block.local_weight(), Difficulty::from_u64(7));
    }

    #[test]
    fn uncles_are_committed_by_the_hash() {
        let plain = make_block(2, BlockHash::new([1; 32]), 1);
        let with_uncle = Block::new(
            2,
            BlockHash::new([1; 32]),
            vec![make_uncle(1, 1)],
            Vec::new(),
            Hash::ZERO,
            Timestamp::new(1_002),
            Address::ZERO,
            Difficulty::ONE,
        );
        assert_ne!(plain.hash(), with_uncle.hash());
        assert!(with_uncle.has_valid_uncles_root());
    }

    #[test]
    fn transactions_root_detects_foreign_body() {
        let empty = make_block(1, BlockHash::new([1; 32]), 1);
        assert!(empty.has_valid_transactions_root());

        let tx = Transaction::transfer(sender(), Address::ZERO, Coin::from_u64(1), 0);
        let forged = Block::with_header(empty.header().clone(), Vec::new(), vec![tx]);
        assert!(!forged.has_valid_transactions_root());
        assert_eq!(forged.hash(), empty.hash());
    }

    #[test]
    fn genesis_requires_number_zero_and_no_parent() {
        assert!(make_block(0, BlockHash::ZERO, 1).is_genesis());
        assert!(!make_block(1, BlockHash::ZERO, 1).is_genesis());
        assert!(!make_block(0, BlockHash::new([1; 32]), 1).is_genesis());
    }

    #[test]
    fn serialized_block_keeps_its_hash() {
        let tx = Transaction::transfer(sender(), Address::ZERO, Coin::from_u64(3), 1);
        let block = Block::new(
            4,
            BlockHash::new([4; 32]),
            vec![make_uncle(3, 1)],
            vec![tx],
            Hash::new([5; 32]),
            Timestamp::new(9),
            sender(),
            Difficulty::from_u64(10),
        );
        let bytes = bincode::serialize(&block).unwrap();
        let decoded: Block = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.hash(), block.hash());
        assert_eq!(decoded.transactions().len(), 1);
        assert_eq!(decoded.local_weight(), Difficulty::from_u64(11));
    }
}
