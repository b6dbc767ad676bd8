//! Block validation against the execution collaborator.

use crate::block::Block;
use crate::LedgerError;
use corvid_store::StateStore;
use std::sync::Arc;

/// Checks a block's declared roots.
///
/// Structural checks (transactions root, uncles root, height) need only the
/// block and its parent. The state check replays the block's transactions on
/// the parent's state through the [`StateStore`] and compares the resulting
/// root with the one the block declares.
#[derive(Clone)]
pub struct BlockValidator {
    state: Arc<dyn StateStore>,
}

impl BlockValidator {
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self { state }
    }

    /// Checks that need no chain context.
    pub fn validate_body(&self, block: &Block) -> Result<(), LedgerError> {
        if !block.has_valid_transactions_root() {
            return Err(invalid(block, "transactions root mismatch"));
        }
        if !block.has_valid_uncles_root() {
            return Err(invalid(block, "uncles root mismatch"));
        }
        Ok(())
    }

    /// Full validation of `block` on top of `parent`.
    ///
    /// Returns [`LedgerError::InvalidBlock`] when the block is wrong and
    /// [`LedgerError::Storage`] when the state store fails.
    pub fn validate(&self, block: &Block, parent: &Block) -> Result<(), LedgerError> {
        self.validate_body(block)?;

        if block.number() != parent.number() + 1 {
            return Err(invalid(block, "number does not follow parent"));
        }

        let root = self.state.execute(
            &parent.state_root(),
            &block.execution_context(),
            block.transactions(),
        )?;
        if root != block.state_root() {
            return Err(invalid(block, "state root mismatch"));
        }
        Ok(())
    }
}

fn invalid(block: &Block, reason: &str) -> LedgerError {
    LedgerError::InvalidBlock {
        hash: block.hash().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corvid_nullables::NullStateStore;
    use corvid_store::StoreError;
    use corvid_transactions::Transaction;
    use corvid_types::{Address, BlockHash, Coin, Difficulty, Hash, Timestamp};

    fn genesis() -> Block {
        Block::new(
            0,
            BlockHash::ZERO,
            Vec::new(),
            Vec::new(),
            Hash::ZERO,
            Timestamp::new(0),
            Address::ZERO,
            Difficulty::ONE,
        )
    }

    fn transfer(nonce: u64) -> Transaction {
        Transaction::transfer(Address::new([1; 20]), Address::new([2; 20]), Coin::from_u64(10), nonce)
    }

    fn child(parent: &Block, transactions: Vec<Transaction>, state_root: Hash) -> Block {
        Block::new(
            parent.number() + 1,
            parent.hash(),
            Vec::new(),
            transactions,
            state_root,
            Timestamp::new(parent.timestamp().as_secs() + 1),
            Address::ZERO,
            Difficulty::ONE,
        )
    }

    fn validator(store: &Arc<NullStateStore>) -> BlockValidator {
        BlockValidator::new(store.clone())
    }

    #[test]
    fn accepts_block_with_matching_state_root() {
        let store = Arc::new(NullStateStore::new());
        let genesis = genesis();
        let txs = vec![transfer(0), transfer(1)];
        let root = NullStateStore::expected_root(&genesis.state_root(), &txs);
        let block = child(&genesis, txs, root);

        assert!(validator(&store).validate(&block, &genesis).is_ok());
    }

    #[test]
    fn empty_block_keeps_parent_state_root() {
        let store = Arc::new(NullStateStore::new());
        let genesis = genesis();
        let block = child(&genesis, Vec::new(), genesis.state_root());

        assert!(validator(&store).validate(&block, &genesis).is_ok());
    }

    #[test]
    fn rejects_state_root_mismatch() {
        let store = Arc::new(NullStateStore::new());
        let genesis = genesis();
        let block = child(&genesis, vec![transfer(0)], Hash::new([0xFF; 32]));

        let err = validator(&store).validate(&block, &genesis).unwrap_err();
        assert!(err.is_invalid_block());
    }

    #[test]
    fn rejects_transactions_root_mismatch() {
        let store = Arc::new(NullStateStore::new());
        let genesis = genesis();
        let empty = child(&genesis, Vec::new(), genesis.state_root());
        let forged = Block::with_header(empty.header().clone(), Vec::new(), vec![transfer(0)]);

        let err = validator(&store).validate(&forged, &genesis).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBlock { ref reason, .. } if reason.contains("transactions root")));
    }

    #[test]
    fn rejects_number_gap() {
        let store = Arc::new(NullStateStore::new());
        let genesis = genesis();
        let skipping = Block::new(
            2,
            genesis.hash(),
            Vec::new(),
            Vec::new(),
            genesis.state_root(),
            Timestamp::new(2),
            Address::ZERO,
            Difficulty::ONE,
        );

        assert!(validator(&store).validate(&skipping, &genesis).unwrap_err().is_invalid_block());
    }

    #[test]
    fn storage_fault_is_not_a_validation_failure() {
        let store = Arc::new(NullStateStore::new());
        let genesis = genesis();
        store.poison(genesis.state_root());
        let block = child(&genesis, Vec::new(), genesis.state_root());

        let err = validator(&store).validate(&block, &genesis).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(StoreError::Backend(_))));
    }
}
