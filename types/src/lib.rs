//! Fundamental types for the drip reward ledger.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! position identifiers, identities, fixed-point amounts, timestamps, and the
//! narrow collaborator traits the accrual core calls through.

pub mod amount;
pub mod error;
pub mod identity;
pub mod position;
pub mod services;
pub mod time;

pub use amount::{AmountParseError, RewardAmount, REWARD_DECIMALS, REWARD_UNIT};
pub use error::TransferError;
pub use identity::Identity;
pub use position::PositionId;
pub use services::{OwnershipOracle, RewardReserve};
pub use time::{Clock, SystemClock, Timestamp};
