//! Global reward-rate schedule.

use crate::error::LedgerError;
use drip_types::{RewardAmount, Timestamp};
use serde::{Deserialize, Serialize};

/// A span of time during which one rate was in force.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSegment {
    /// Raw reward units per second per active position.
    pub rate: RewardAmount,
    /// When this rate became effective.
    pub start: Timestamp,
    /// When this rate stopped being effective (None if still active).
    pub end: Option<Timestamp>,
}

/// Append-only history of the rate, shared by all positions.
///
/// A rate change closes the current segment and appends a new one, so it is
/// O(1) and never touches a position. Settling a position intersects this
/// history with `[checkpoint, now)`, O(k) in the number of rate changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    segments: Vec<RateSegment>,
}

impl RateSchedule {
    pub fn new(initial_rate: RewardAmount, genesis: Timestamp) -> Self {
        Self {
            segments: vec![RateSegment {
                rate: initial_rate,
                start: genesis,
                end: None,
            }],
        }
    }

    pub fn segments(&self) -> &[RateSegment] {
        &self.segments
    }

    /// Make `new_rate` effective from `change_at` onward.
    ///
    /// A change stamped at the current segment's start replaces its rate
    /// instead of leaving a zero-length segment behind.
    pub fn apply_rate_change(
        &mut self,
        new_rate: RewardAmount,
        change_at: Timestamp,
    ) -> Result<(), LedgerError> {
        let Some(current) = self.segments.last_mut() else {
            self.segments.push(RateSegment {
                rate: new_rate,
                start: change_at,
                end: None,
            });
            return Ok(());
        };
        if change_at < current.start {
            return Err(LedgerError::InvalidTimestamp);
        }
        if change_at == current.start {
            current.rate = new_rate;
            return Ok(());
        }
        current.end = Some(change_at);
        self.segments.push(RateSegment {
            rate: new_rate,
            start: change_at,
            end: None,
        });
        Ok(())
    }

    /// The rate in force right now.
    pub fn current_rate(&self) -> RewardAmount {
        self.segments
            .last()
            .map(|s| s.rate)
            .unwrap_or(RewardAmount::ZERO)
    }

    /// Reward earned by one active position over `[from, to)`.
    ///
    /// Sums `overlap × rate` over every segment. Time before the first segment
    /// earns nothing. Returns `None` on overflow.
    pub fn accrued_between_checked(&self, from: Timestamp, to: Timestamp) -> Option<RewardAmount> {
        if to <= from {
            return Some(RewardAmount::ZERO);
        }
        let mut total: u128 = 0;
        for seg in &self.segments {
            let seg_end = seg.end.map_or(to, |end| end.min(to));
            let effective_start = seg.start.max(from);
            if effective_start >= seg_end {
                continue;
            }
            let duration = effective_start.elapsed_since(seg_end) as u128;
            let segment_accrual = seg.rate.raw().checked_mul(duration)?;
            total = total.checked_add(segment_accrual)?;
        }
        Some(RewardAmount::new(total))
    }

    /// Reward earned over `[from, to)`, returning 0 on overflow.
    pub fn accrued_between(&self, from: Timestamp, to: Timestamp) -> RewardAmount {
        self.accrued_between_checked(from, to)
            .unwrap_or(RewardAmount::ZERO)
    }
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self::new(RewardAmount::ZERO, Timestamp::EPOCH)
    }
}
