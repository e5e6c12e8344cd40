//! Abstract storage traits for the drip reward ledger.
//!
//! Every storage backend (embedded KV, SQL, in-memory for testing) implements
//! these traits. The ledger depends only on the traits.

pub mod error;
pub mod ledger;

pub use error::StoreError;
pub use ledger::LedgerStore;
