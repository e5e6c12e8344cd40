//! Accrual engine: folds elapsed time into a position's `accrued` balance.
//!
//! `accrued' = accrued + Σ(rate_i × overlap_i)` over the schedule segments that
//! overlap `[checkpoint, now)`, then `checkpoint' = now`.
//!
//! All values are deterministic integers: rates are raw units per second,
//! timestamps are whole seconds, and arithmetic is checked.

use crate::error::LedgerError;
use crate::position::Position;
use crate::schedule::RateSchedule;
use drip_types::{RewardAmount, Timestamp};

/// Result of settling one position up to some instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub accrued: RewardAmount,
    pub checkpoint: Timestamp,
    /// The increment folded in by this settlement.
    pub earned: RewardAmount,
}

/// Compute the settled state of `position` at `now`. Pure.
///
/// Inactive positions are returned unchanged. `now` earlier than the stored
/// checkpoint is rejected rather than treated as zero elapsed time.
pub fn settle(
    position: &Position,
    schedule: &RateSchedule,
    now: Timestamp,
) -> Result<Settlement, LedgerError> {
    if !position.active {
        return Ok(Settlement {
            accrued: position.accrued,
            checkpoint: position.checkpoint,
            earned: RewardAmount::ZERO,
        });
    }
    if now < position.checkpoint {
        return Err(LedgerError::InvalidTimestamp);
    }
    let earned = schedule
        .accrued_between_checked(position.checkpoint, now)
        .ok_or(LedgerError::Overflow)?;
    let accrued = position
        .accrued
        .checked_add(earned)
        .ok_or(LedgerError::Overflow)?;
    Ok(Settlement {
        accrued,
        checkpoint: now,
        earned,
    })
}

/// Settle `position` in place at `now`.
pub fn settle_in_place(
    position: &mut Position,
    schedule: &RateSchedule,
    now: Timestamp,
) -> Result<RewardAmount, LedgerError> {
    let s = settle(position, schedule, now)?;
    position.accrued = s.accrued;
    position.checkpoint = s.checkpoint;
    Ok(s.earned)
}
