//! The drip reward accrual and settlement engine.
//!
//! Every active position earns `rate × elapsed` against a global, piecewise-constant
//! rate schedule, and is paid out of a finite reserve.
//!
//! This crate handles:
//! - Rate schedule segments (rate changes never alter already-elapsed accrual)
//! - Per-position settlement into a checkpointed `accrued` balance
//! - Reserve clamping (pay what exists, keep the remainder owed)
//! - Single and batched enter/leave/claim with all-or-nothing semantics

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod position;
pub mod registry;
pub mod reserve;
pub mod schedule;

pub use config::LedgerConfig;
pub use engine::{settle, Settlement};
pub use error::LedgerError;
pub use ledger::{ClaimReceipt, RewardLedger};
pub use position::Position;
pub use registry::{PositionRegistry, StagedChanges};
pub use reserve::{clamp_payout, drain_in_order, Clamp};
pub use schedule::{RateSchedule, RateSegment};
