//! The reward ledger: position lifecycle, batch coordination and authority calls.
//!
//! Every mutating call stages its changes on copies of the affected positions
//! and commits only after all checks (and the reserve transfer, if any) have
//! succeeded. A failing call leaves the registry and schedule untouched.

use std::collections::HashSet;

use drip_store::LedgerStore;
use drip_types::{
    Clock, Identity, OwnershipOracle, PositionId, RewardAmount, RewardReserve, Timestamp,
};

use crate::config::LedgerConfig;
use crate::engine::{settle, settle_in_place};
use crate::error::LedgerError;
use crate::position::Position;
use crate::registry::{PositionRegistry, StagedChanges};
use crate::reserve::{clamp_payout, drain_in_order, Clamp};
use crate::schedule::RateSchedule;

const META_RATE_SCHEDULE: &[u8] = b"rate_schedule";

/// What a claim actually paid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub recipient: Identity,
    /// Per-position share of the payout, in the order the ids were given.
    pub paid: Vec<(PositionId, RewardAmount)>,
    pub total: RewardAmount,
    /// Owed but left unpaid because the reserve ran short; still in `accrued`.
    pub shortfall: RewardAmount,
}

/// Reward ledger over an ownership oracle `O`, payout reserve `R` and clock `C`.
///
/// Mutations take `&mut self`: the ledger assumes a single serialized writer.
pub struct RewardLedger<O, R, C> {
    config: LedgerConfig,
    authority: Identity,
    schedule: RateSchedule,
    registry: PositionRegistry,
    oracle: O,
    reserve: R,
    clock: C,
}

impl<O, R, C> RewardLedger<O, R, C>
where
    O: OwnershipOracle,
    R: RewardReserve,
    C: Clock,
{
    pub fn new(config: LedgerConfig, oracle: O, reserve: R, clock: C) -> Result<Self, LedgerError> {
        config.validate()?;
        let schedule = RateSchedule::new(config.initial_rate()?, config.genesis());
        Ok(Self {
            authority: config.authority(),
            config,
            schedule,
            registry: PositionRegistry::new(),
            oracle,
            reserve,
            clock,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn authority(&self) -> &Identity {
        &self.authority
    }

    pub fn schedule(&self) -> &RateSchedule {
        &self.schedule
    }

    pub fn registry(&self) -> &PositionRegistry {
        &self.registry
    }

    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.registry.get(id)
    }

    /// Whether `id` is currently staked. Never-entered ids are not.
    pub fn is_active(&self, id: PositionId) -> bool {
        self.registry.get(id).is_some_and(|p| p.active)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Start (or resume) accrual for a position the caller owns.
    pub fn enter(&mut self, caller: &Identity, id: PositionId) -> Result<(), LedgerError> {
        let now = self.clock.now();
        let mut staged = self.registry.stage();
        self.stage_enter(&mut staged, caller, id, now)?;
        let changes = staged.into_changes();
        self.registry.commit(changes);
        tracing::info!(id = %id, caller = %caller, at = %now, "position entered");
        Ok(())
    }

    /// Settle up to now and stop accrual. Returns the amount paid, which is
    /// zero unless `claim_on_leave` is configured.
    pub fn leave(
        &mut self,
        caller: &Identity,
        id: PositionId,
    ) -> Result<RewardAmount, LedgerError> {
        self.leave_ids(caller, &[id])
    }

    /// Settle and pay a single position.
    pub fn claim_rewards(
        &mut self,
        caller: &Identity,
        id: PositionId,
    ) -> Result<RewardAmount, LedgerError> {
        self.claim_ids(caller, &[id]).map(|receipt| receipt.total)
    }

    /// What `claim_rewards` would pay right now, clamped to the reserve.
    pub fn claimable_rewards_checked(&self, id: PositionId) -> Result<RewardAmount, LedgerError> {
        self.claimable_total(&[id])
    }

    /// What `claim_rewards` would pay right now, returning 0 on overflow.
    pub fn claimable_rewards(&self, id: PositionId) -> RewardAmount {
        self.claimable_rewards_checked(id).unwrap_or(RewardAmount::ZERO)
    }

    /// Reward per second each active position earns right now.
    pub fn rewards_rate_per_second(&self) -> RewardAmount {
        self.schedule.current_rate()
    }

    // ── Batches ────────────────────────────────────────────────────────

    pub fn multi_enter(
        &mut self,
        caller: &Identity,
        ids: &[PositionId],
    ) -> Result<(), LedgerError> {
        self.check_batch(ids)?;
        let now = self.clock.now();
        let mut staged = self.registry.stage();
        for &id in ids {
            self.stage_enter(&mut staged, caller, id, now)?;
        }
        let changes = staged.into_changes();
        self.registry.commit(changes);
        tracing::info!(caller = %caller, count = ids.len(), at = %now, "positions entered");
        Ok(())
    }

    pub fn multi_leave(
        &mut self,
        caller: &Identity,
        ids: &[PositionId],
    ) -> Result<RewardAmount, LedgerError> {
        self.check_batch(ids)?;
        self.leave_ids(caller, ids)
    }

    /// Settle every listed position and pay them in one transfer.
    ///
    /// The reserve clamp applies to the aggregate. When it binds, positions are
    /// paid in listed order and the unpaid remainder stays in `accrued`.
    pub fn multi_claim_rewards(
        &mut self,
        caller: &Identity,
        ids: &[PositionId],
    ) -> Result<ClaimReceipt, LedgerError> {
        self.check_batch(ids)?;
        self.claim_ids(caller, &distinct(ids))
    }

    /// Sum of what every listed position is owed, clamped once to the reserve.
    pub fn multi_claimable_rewards(&self, ids: &[PositionId]) -> RewardAmount {
        self.claimable_total(&distinct(ids)).unwrap_or(RewardAmount::ZERO)
    }

    /// Combined reward per second of the listed positions.
    ///
    /// Every listed id counts at the current rate, whether staked or not.
    pub fn multi_rewards_rate_per_second(
        &self,
        ids: &[PositionId],
    ) -> Result<RewardAmount, LedgerError> {
        self.schedule
            .current_rate()
            .checked_mul(distinct(ids).len() as u128)
            .ok_or(LedgerError::Overflow)
    }

    // ── Authority ──────────────────────────────────────────────────────

    /// Make `rate` effective from now. Time already elapsed keeps the old rate.
    pub fn set_rewards_rate(
        &mut self,
        caller: &Identity,
        rate: RewardAmount,
    ) -> Result<(), LedgerError> {
        self.check_authority(caller)?;
        let now = self.clock.now();
        let previous = self.schedule.current_rate();
        self.schedule.apply_rate_change(rate, now)?;
        tracing::info!(from = %previous, to = %rate, at = %now, "rewards rate changed");
        Ok(())
    }

    /// Pay the entire reserve balance to the authority.
    pub fn withdraw_reserve(&mut self, caller: &Identity) -> Result<RewardAmount, LedgerError> {
        self.check_authority(caller)?;
        let balance = self.reserve.balance();
        if balance.is_zero() {
            return Err(LedgerError::NothingToClaim);
        }
        self.reserve.pay_out(&self.authority, balance)?;
        tracing::info!(amount = %balance, "reserve withdrawn");
        Ok(balance)
    }

    // ── Persistence ────────────────────────────────────────────────────

    /// Persist the schedule and every position to a ledger store.
    ///
    /// Records are written one at a time, schedule first. A store error part
    /// way through can leave the store holding a mix of old and new records;
    /// save again before restoring from it.
    pub fn save_to_store(&self, store: &dyn LedgerStore) -> Result<(), LedgerError> {
        let schedule_bytes = bincode::serialize(&self.schedule)
            .map_err(|e| LedgerError::Store(e.to_string()))?;
        store
            .put_meta(META_RATE_SCHEDULE, &schedule_bytes)
            .map_err(|e| LedgerError::Store(e.to_string()))?;

        for position in self.registry.iter() {
            let bytes =
                bincode::serialize(position).map_err(|e| LedgerError::Store(e.to_string()))?;
            store
                .put_position(position.id, &bytes)
                .map_err(|e| LedgerError::Store(e.to_string()))?;
        }
        tracing::debug!(positions = self.registry.len(), "ledger saved");
        Ok(())
    }

    /// Replace the in-memory schedule and registry with what the store holds.
    ///
    /// A store with nothing saved leaves the ledger as it is. Nothing is
    /// replaced unless every record decodes.
    pub fn restore_from_store(&mut self, store: &dyn LedgerStore) -> Result<(), LedgerError> {
        let saved = store
            .get_meta(META_RATE_SCHEDULE)
            .map_err(|e| LedgerError::Store(e.to_string()))?;
        let entries = store
            .iter_positions()
            .map_err(|e| LedgerError::Store(e.to_string()))?;

        let schedule: RateSchedule = match saved {
            Some(bytes) => {
                bincode::deserialize(&bytes).map_err(|e| LedgerError::Store(e.to_string()))?
            }
            None if entries.is_empty() => {
                tracing::debug!("store holds no saved ledger; keeping current state");
                return Ok(());
            }
            None => {
                return Err(LedgerError::Store(format!(
                    "{} position records saved without a rate schedule",
                    entries.len()
                )))
            }
        };

        let mut registry = PositionRegistry::new();
        for (id, bytes) in entries {
            let position: Position =
                bincode::deserialize(&bytes).map_err(|e| LedgerError::Store(e.to_string()))?;
            if position.id != id {
                return Err(LedgerError::Store(format!(
                    "record stored under {} holds position {}",
                    id, position.id
                )));
            }
            registry.insert(position);
        }

        self.schedule = schedule;
        self.registry = registry;
        tracing::debug!(positions = self.registry.len(), "ledger restored");
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn check_owner(&self, caller: &Identity, id: PositionId) -> Result<(), LedgerError> {
        let owner = self
            .oracle
            .owner_of(id)
            .ok_or(LedgerError::NoSuchPosition(id))?;
        if owner != *caller {
            return Err(LedgerError::NotOwner {
                id,
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    fn check_authority(&self, caller: &Identity) -> Result<(), LedgerError> {
        if *caller != self.authority {
            tracing::warn!(caller = %caller, "rejected authority call");
            return Err(LedgerError::NotAuthority);
        }
        Ok(())
    }

    fn check_batch(&self, ids: &[PositionId]) -> Result<(), LedgerError> {
        if ids.is_empty() {
            return Err(LedgerError::EmptyBatch);
        }
        if ids.len() > self.config.max_batch_size {
            return Err(LedgerError::BatchTooLarge {
                len: ids.len(),
                max: self.config.max_batch_size,
            });
        }
        Ok(())
    }

    fn stage_enter(
        &self,
        staged: &mut StagedChanges<'_>,
        caller: &Identity,
        id: PositionId,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.check_owner(caller, id)?;
        let position = match staged.get(id) {
            Some(p) if p.active => return Err(LedgerError::AlreadyActive(id)),
            Some(mut p) => {
                p.reactivate(now);
                p
            }
            None => Position::new(id, now),
        };
        staged.put(position);
        Ok(())
    }

    fn stage_leave(
        &self,
        staged: &mut StagedChanges<'_>,
        caller: &Identity,
        id: PositionId,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.check_owner(caller, id)?;
        let mut position = staged
            .get(id)
            .filter(|p| p.active)
            .ok_or(LedgerError::NotActive(id))?;
        let earned = settle_in_place(&mut position, &self.schedule, now)?;
        position.deactivate();
        tracing::debug!(
            id = %id,
            earned = %earned,
            accrued = %position.accrued,
            "position settled on leave"
        );
        staged.put(position);
        Ok(())
    }

    /// Settle `ids` (distinct) and take their payout out of staged `accrued`,
    /// draining the clamped total in listed order.
    fn stage_payout(
        &self,
        staged: &mut StagedChanges<'_>,
        ids: &[PositionId],
        now: Timestamp,
    ) -> Result<(Clamp, Vec<(PositionId, RewardAmount)>), LedgerError> {
        let mut owed = Vec::with_capacity(ids.len());
        for &id in ids {
            match staged.get(id) {
                Some(mut position) => {
                    settle_in_place(&mut position, &self.schedule, now)?;
                    owed.push(position.accrued);
                    staged.put(position);
                }
                None => owed.push(RewardAmount::ZERO),
            }
        }

        let total = sum(&owed)?;
        let clamp = clamp_payout(total, self.reserve.balance());
        let shares = drain_in_order(&owed, clamp.payable);

        let mut paid = Vec::with_capacity(ids.len());
        for (&id, share) in ids.iter().zip(shares) {
            if !share.is_zero() {
                if let Some(mut position) = staged.get(id) {
                    position.accrued = position
                        .accrued
                        .checked_sub(share)
                        .ok_or(LedgerError::Overflow)?;
                    position.total_claimed = position
                        .total_claimed
                        .checked_add(share)
                        .ok_or(LedgerError::Overflow)?;
                    staged.put(position);
                }
            }
            paid.push((id, share));
        }
        Ok((clamp, paid))
    }

    fn leave_ids(
        &mut self,
        caller: &Identity,
        ids: &[PositionId],
    ) -> Result<RewardAmount, LedgerError> {
        let now = self.clock.now();
        let mut staged = self.registry.stage();
        for &id in ids {
            self.stage_leave(&mut staged, caller, id, now)?;
        }

        let mut paid = RewardAmount::ZERO;
        if self.config.claim_on_leave {
            // Duplicates already failed as NotActive, so `ids` is distinct here.
            let (clamp, _) = self.stage_payout(&mut staged, ids, now)?;
            if !clamp.payable.is_zero() {
                self.reserve.pay_out(caller, clamp.payable)?;
            }
            if !clamp.shortfall.is_zero() {
                tracing::warn!(
                    caller = %caller,
                    shortfall = %clamp.shortfall,
                    "reserve short on leave; remainder stays owed"
                );
            }
            paid = clamp.payable;
        }

        let changes = staged.into_changes();
        self.registry.commit(changes);
        tracing::info!(
            caller = %caller,
            count = ids.len(),
            paid = %paid,
            at = %now,
            "positions left"
        );
        Ok(paid)
    }

    fn claim_ids(
        &mut self,
        caller: &Identity,
        ids: &[PositionId],
    ) -> Result<ClaimReceipt, LedgerError> {
        let now = self.clock.now();
        for &id in ids {
            self.check_owner(caller, id)?;
        }
        if self.reserve.balance().is_zero() {
            tracing::warn!(caller = %caller, "claim rejected: reserve is empty");
            return Err(LedgerError::RewardsStopped);
        }

        let mut staged = self.registry.stage();
        let (clamp, paid) = self.stage_payout(&mut staged, ids, now)?;
        if clamp.payable.is_zero() {
            return Err(LedgerError::NothingToClaim);
        }
        self.reserve.pay_out(caller, clamp.payable)?;
        let changes = staged.into_changes();
        self.registry.commit(changes);

        if !clamp.shortfall.is_zero() {
            tracing::warn!(
                caller = %caller,
                shortfall = %clamp.shortfall,
                "reserve short on claim; remainder stays owed"
            );
        }
        tracing::info!(
            caller = %caller,
            count = ids.len(),
            amount = %clamp.payable,
            at = %now,
            "rewards claimed"
        );
        Ok(ClaimReceipt {
            recipient: caller.clone(),
            paid,
            total: clamp.payable,
            shortfall: clamp.shortfall,
        })
    }

    /// Settled `accrued` summed over distinct `ids`, clamped to the reserve.
    fn claimable_total(&self, ids: &[PositionId]) -> Result<RewardAmount, LedgerError> {
        let now = self.clock.now();
        let mut owed = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(position) = self.registry.get(id) {
                owed.push(settle(position, &self.schedule, now)?.accrued);
            }
        }
        Ok(clamp_payout(sum(&owed)?, self.reserve.balance()).payable)
    }
}

fn sum(amounts: &[RewardAmount]) -> Result<RewardAmount, LedgerError> {
    amounts
        .iter()
        .try_fold(RewardAmount::ZERO, |acc, a| acc.checked_add(*a))
        .ok_or(LedgerError::Overflow)
}

/// `ids` with repeats removed, first occurrence kept.
fn distinct(ids: &[PositionId]) -> Vec<PositionId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
