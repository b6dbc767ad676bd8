//! Storage capabilities consumed by the chain core.
//!
//! The account-state engine lives outside this workspace. Block validation
//! reaches it only through the [`StateStore`] trait: look up the state at a
//! root hash, execute a block's transactions on it, and report the new root.

pub mod error;
pub mod state;

pub use error::StoreError;
pub use state::{ExecutionContext, StateStore};
