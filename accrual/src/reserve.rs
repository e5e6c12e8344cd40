//! Reserve guard: never pay more than the reserve holds.

use drip_types::RewardAmount;

/// Outcome of clamping a payout to the available reserve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clamp {
    pub payable: RewardAmount,
    /// Requested but unpayable; stays owed to the position.
    pub shortfall: RewardAmount,
}

pub fn clamp_payout(requested: RewardAmount, available: RewardAmount) -> Clamp {
    let payable = requested.min(available);
    Clamp {
        payable,
        shortfall: requested.saturating_sub(payable),
    }
}

/// Split `payable` across `owed` in listed order.
///
/// Each entry takes `min(owed, remaining)`; once the pool runs dry the rest
/// receive zero. The result has the same length as `owed` and sums to
/// `min(payable, Σ owed)`.
pub fn drain_in_order(owed: &[RewardAmount], payable: RewardAmount) -> Vec<RewardAmount> {
    let mut remaining = payable;
    owed.iter()
        .map(|&amount| {
            let share = amount.min(remaining);
            remaining = remaining.saturating_sub(share);
            share
        })
        .collect()
}
