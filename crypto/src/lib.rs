//! Hashing primitives for the Corvid node.
//!
//! Every content-derived identifier (block hash, transaction hash,
//! transactions root) is a 256-bit Blake2b digest.

pub mod hash;

pub use hash::{blake2b_256, blake2b_256_multi, hash_block, hash_root, hash_transaction};
