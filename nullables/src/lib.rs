//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of the ledger (clock, ownership oracle, payout
//! reserve, storage) are abstracted behind traits. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod clock;
pub mod ownership;
pub mod reserve;
pub mod store;

pub use clock::NullClock;
pub use ownership::NullOwnership;
pub use reserve::NullReserve;
pub use store::NullLedgerStore;
