//! Per-position accrual state.

use drip_types::{PositionId, RewardAmount, Timestamp};
use serde::{Deserialize, Serialize};

/// Accrual state for a single staked position.
///
/// Lightweight: only per-position data. The rate lives in the global
/// [`RateSchedule`](crate::RateSchedule).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,

    /// True while deposited and earning.
    pub active: bool,

    /// When the position last entered.
    pub entered_at: Timestamp,

    /// Last settlement time. Frozen at the leave time while inactive.
    pub checkpoint: Timestamp,

    /// Earned but not yet paid. Only a claim reduces it, by exactly the amount paid.
    pub accrued: RewardAmount,

    /// Total ever paid out for this position (cumulative, never decreases).
    #[serde(default)]
    pub total_claimed: RewardAmount,
}

impl Position {
    /// A freshly entered position.
    pub fn new(id: PositionId, now: Timestamp) -> Self {
        Self {
            id,
            active: true,
            entered_at: now,
            checkpoint: now,
            accrued: RewardAmount::ZERO,
            total_claimed: RewardAmount::ZERO,
        }
    }

    /// Stop accrual. The caller settles first so the checkpoint is the leave time.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Resume accrual from `at`. Whatever was left in `accrued` is kept.
    pub fn reactivate(&mut self, at: Timestamp) {
        self.active = true;
        self.entered_at = at;
        self.checkpoint = at;
    }
}
