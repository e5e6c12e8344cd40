//! Capability traits for the services the ledger does not own.
//!
//! Each trait covers exactly one concern so the accrual core stays decoupled
//! from custody, identity and token-transfer mechanics.

use crate::{Identity, PositionId, RewardAmount, TransferError};

/// Answers "who controls this position's underlying asset right now?".
pub trait OwnershipOracle {
    /// `None` when the asset does not exist upstream.
    fn owner_of(&self, id: PositionId) -> Option<Identity>;
}

/// The finite pool rewards are paid out of.
pub trait RewardReserve {
    /// Amount currently available for payout.
    fn balance(&self) -> RewardAmount;

    /// Move `amount` out of the reserve to `recipient`.
    fn pay_out(&self, recipient: &Identity, amount: RewardAmount) -> Result<(), TransferError>;
}

impl<T: OwnershipOracle + ?Sized> OwnershipOracle for &T {
    fn owner_of(&self, id: PositionId) -> Option<Identity> {
        (**self).owner_of(id)
    }
}

impl<T: RewardReserve + ?Sized> RewardReserve for &T {
    fn balance(&self) -> RewardAmount {
        (**self).balance()
    }

    fn pay_out(&self, recipient: &Identity, amount: RewardAmount) -> Result<(), TransferError> {
        (**self).pay_out(recipient, amount)
    }
}
