//! Ledger errors.
//!
//! Every error leaves the registry and schedule exactly as they were before
//! the failing call.

use drip_types::{Identity, PositionId, TransferError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{caller} does not own position {id}")]
    NotOwner { id: PositionId, caller: Identity },

    #[error("position {0} is already active")]
    AlreadyActive(PositionId),

    #[error("position {0} is not active")]
    NotActive(PositionId),

    #[error("nothing to claim")]
    NothingToClaim,

    #[error("rewards have stopped: the reserve is empty")]
    RewardsStopped,

    #[error("position {0} does not exist upstream")]
    NoSuchPosition(PositionId),

    #[error("caller is not the ledger authority")]
    NotAuthority,

    #[error("timestamp precedes the current checkpoint or rate segment")]
    InvalidTimestamp,

    #[error("arithmetic overflow in reward computation")]
    Overflow,

    #[error("batch is empty")]
    EmptyBatch,

    #[error("batch of {len} positions exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("reward transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),
}
