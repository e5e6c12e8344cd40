//! Nullable reserve: an in-memory payout pool.

use drip_types::{Identity, RewardAmount, RewardReserve, TransferError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// An in-memory reward reserve that records every payout.
///
/// Transfers can be made to fail on demand to exercise the ledger's
/// no-partial-mutation guarantee.
#[derive(Default)]
pub struct NullReserve {
    balance: Cell<u128>,
    deposited: Cell<u128>,
    paid: RefCell<HashMap<Identity, RewardAmount>>,
    fail_transfers: Cell<bool>,
}

impl NullReserve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(amount: RewardAmount) -> Self {
        let reserve = Self::new();
        reserve.deposit(amount);
        reserve
    }

    /// Replenish the reserve.
    pub fn deposit(&self, amount: RewardAmount) {
        self.balance
            .set(self.balance.get().saturating_add(amount.raw()));
        self.deposited
            .set(self.deposited.get().saturating_add(amount.raw()));
    }

    /// Total ever deposited.
    pub fn total_deposited(&self) -> RewardAmount {
        RewardAmount::new(self.deposited.get())
    }

    /// Total ever paid to `recipient`.
    pub fn paid_to(&self, recipient: &Identity) -> RewardAmount {
        self.paid
            .borrow()
            .get(recipient)
            .copied()
            .unwrap_or(RewardAmount::ZERO)
    }

    /// Total ever paid to anyone.
    pub fn total_paid(&self) -> RewardAmount {
        RewardAmount::new(self.paid.borrow().values().map(|a| a.raw()).sum())
    }

    /// Make every subsequent transfer fail with a backend error.
    pub fn fail_transfers(&self, fail: bool) {
        self.fail_transfers.set(fail);
    }
}

impl RewardReserve for NullReserve {
    fn balance(&self) -> RewardAmount {
        RewardAmount::new(self.balance.get())
    }

    fn pay_out(&self, recipient: &Identity, amount: RewardAmount) -> Result<(), TransferError> {
        if self.fail_transfers.get() {
            return Err(TransferError::Backend("transfers disabled".into()));
        }
        let available = self.balance.get();
        let remaining = available
            .checked_sub(amount.raw())
            .ok_or(TransferError::InsufficientReserve {
                needed: amount.raw(),
                available,
            })?;
        self.balance.set(remaining);
        let mut paid = self.paid.borrow_mut();
        let entry = paid.entry(recipient.clone()).or_insert(RewardAmount::ZERO);
        *entry = RewardAmount::new(entry.raw().saturating_add(amount.raw()));
        Ok(())
    }
}
