//! Errors raised by the external collaborators the ledger calls through.

use thiserror::Error;

/// Failure reported by a [`RewardReserve`](crate::RewardReserve) transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("insufficient reserve: need {needed}, available {available}")]
    InsufficientReserve { needed: u128, available: u128 },

    #[error("transfer backend error: {0}")]
    Backend(String),
}
