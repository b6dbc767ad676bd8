//! Blake2b hashing for blocks, transactions and roots.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use corvid_types::{BlockHash, Hash, TxHash};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash the encoded fields of a block header to produce its `BlockHash`.
pub fn hash_block(header_parts: &[&[u8]]) -> BlockHash {
    BlockHash::new(blake2b_256_multi(header_parts))
}

/// Hash the encoded fields of a transaction to produce its `TxHash`.
pub fn hash_transaction(tx_parts: &[&[u8]]) -> TxHash {
    TxHash::new(blake2b_256_multi(tx_parts))
}

/// Hash a sequence of digests into a single root (transactions root, uncles root).
pub fn hash_root<'a>(leaves: impl IntoIterator<Item = &'a [u8; 32]>) -> Hash {
    let mut hasher = Blake2b256::new();
    for leaf in leaves {
        hasher.update(leaf);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    Hash::new(output)
}
