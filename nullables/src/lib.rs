//! Nullable infrastructure for deterministic testing.
//!
//! External collaborators of the chain core (the clock and the account-state
//! engine) are abstracted behind traits or plain values. This crate provides
//! stand-ins that:
//! - Return deterministic values
//! - Can be controlled programmatically, including injected faults
//! - Never touch the filesystem or network

pub mod clock;
pub mod state;

pub use clock::NullClock;
pub use state::NullStateStore;
