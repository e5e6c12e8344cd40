//! End-to-end ledger scenarios at the production rate of 50 units per day.
//!
//! These wire the ledger to the in-memory ownership registry, reserve and
//! clock, and drive whole stake / claim / leave lifecycles through them.

use drip_accrual::{LedgerConfig, LedgerError, RewardLedger};
use drip_nullables::{NullClock, NullLedgerStore, NullOwnership, NullReserve};
use drip_types::{Identity, PositionId, RewardAmount, RewardReserve, REWARD_UNIT};

const DAY: u64 = 86_400;
const BASE_RATE: u128 = 578_703_703_703_703;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct World {
    oracle: NullOwnership,
    reserve: NullReserve,
    clock: NullClock,
}

type Ledger<'a> = RewardLedger<&'a NullOwnership, &'a NullReserve, &'a NullClock>;

impl World {
    fn new() -> Self {
        Self {
            oracle: NullOwnership::new(),
            reserve: NullReserve::new(),
            clock: NullClock::new(1_700_000_000),
        }
    }

    fn ledger(&self) -> Ledger<'_> {
        self.ledger_with(LedgerConfig {
            genesis: 1_700_000_000,
            ..LedgerConfig::default()
        })
    }

    fn ledger_with(&self, config: LedgerConfig) -> Ledger<'_> {
        RewardLedger::new(config, &self.oracle, &self.reserve, &self.clock).unwrap()
    }

    fn mint(&self, id: u64, owner: &Identity) -> PositionId {
        let id = PositionId::new(id);
        self.oracle.mint(id, owner.clone());
        id
    }

    fn mint_many(&self, count: u64, owner: &Identity) -> Vec<PositionId> {
        (1..=count).map(|i| self.mint(i, owner)).collect()
    }
}

fn units(n: u128) -> RewardAmount {
    RewardAmount::from_units(n).unwrap()
}

fn alice() -> Identity {
    Identity::new("alice")
}

fn bob() -> Identity {
    Identity::new("bob")
}

fn authority() -> Identity {
    Identity::new("authority")
}

fn assert_between(amount: RewardAmount, low_units: u128, high_units: u128) {
    assert!(
        amount >= units(low_units) && amount <= units(high_units),
        "{amount} not within [{low_units}, {high_units}]"
    );
}

// ---------------------------------------------------------------------------
// Accrual
// ---------------------------------------------------------------------------

#[test]
fn half_day_and_full_day_accrual() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000_000));
    let id = w.mint(1, &alice());

    ledger.enter(&alice(), id).unwrap();
    w.clock.advance(DAY / 2);
    assert_between(ledger.claimable_rewards(id), 24, 26);

    w.clock.advance(DAY / 2);
    let day = ledger.claimable_rewards(id);
    assert_between(day, 49, 51);
    assert_eq!(day.raw(), BASE_RATE * DAY as u128);
}

#[test]
fn hundred_positions_claimed_together() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000_000));
    let ids = w.mint_many(100, &alice());

    ledger.multi_enter(&alice(), &ids).unwrap();
    w.clock.advance(DAY);

    let expected = BASE_RATE * 100 * DAY as u128;
    assert_eq!(ledger.multi_claimable_rewards(&ids).raw(), expected);

    let receipt = ledger.multi_claim_rewards(&alice(), &ids).unwrap();
    let diff = receipt.total.raw().abs_diff(expected);
    assert!(diff <= 50 * REWARD_UNIT, "off by {diff}");
    assert_eq!(receipt.paid.len(), 100);
    assert_eq!(receipt.shortfall, RewardAmount::ZERO);
    assert_eq!(w.reserve.paid_to(&alice()), receipt.total);
    assert_eq!(ledger.multi_claimable_rewards(&ids), RewardAmount::ZERO);
}

#[test]
fn leave_freezes_and_reenter_resumes() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000_000));
    let id = w.mint(1, &alice());

    ledger.enter(&alice(), id).unwrap();
    w.clock.advance(DAY);
    ledger.leave(&alice(), id).unwrap();
    let frozen = ledger.claimable_rewards(id);
    assert_between(frozen, 49, 51);

    w.clock.advance(3 * DAY);
    assert_eq!(ledger.claimable_rewards(id), frozen);

    ledger.enter(&alice(), id).unwrap();
    w.clock.advance(DAY);
    assert_eq!(
        ledger.claimable_rewards(id).raw(),
        frozen.raw() + BASE_RATE * DAY as u128
    );
}

#[test]
fn three_step_rate_change_integrates_each_segment() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000_000));
    let id = w.mint(1, &alice());

    ledger.enter(&alice(), id).unwrap();
    w.clock.advance(DAY);
    ledger
        .set_rewards_rate(&authority(), RewardAmount::new(BASE_RATE / 2))
        .unwrap();
    w.clock.advance(DAY);
    ledger
        .set_rewards_rate(&authority(), RewardAmount::new(BASE_RATE / 4))
        .unwrap();
    w.clock.advance(DAY);

    let expected = (BASE_RATE + BASE_RATE / 2 + BASE_RATE / 4) * DAY as u128;
    assert_eq!(ledger.claimable_rewards(id).raw(), expected);
    assert_between(ledger.claimable_rewards(id), 87, 88);
    assert_eq!(ledger.schedule().segments().len(), 3);
    assert_eq!(ledger.rewards_rate_per_second().raw(), BASE_RATE / 4);
}

#[test]
fn zero_rate_stops_new_accrual_but_keeps_what_was_earned() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000_000));
    let id = w.mint(1, &alice());

    ledger.enter(&alice(), id).unwrap();
    w.clock.advance(DAY);
    ledger
        .set_rewards_rate(&authority(), RewardAmount::ZERO)
        .unwrap();
    let earned = ledger.claimable_rewards(id);
    w.clock.advance(10 * DAY);
    assert_eq!(ledger.claimable_rewards(id), earned);
}

// ---------------------------------------------------------------------------
// Reserve
// ---------------------------------------------------------------------------

#[test]
fn exhausted_reserve_stops_then_resumes_in_full() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(10));
    let id = w.mint(1, &alice());

    ledger.enter(&alice(), id).unwrap();
    w.clock.advance(DAY);
    let owed = BASE_RATE * DAY as u128;

    assert_eq!(ledger.claim_rewards(&alice(), id).unwrap(), units(10));
    assert_eq!(w.reserve.balance(), RewardAmount::ZERO);
    assert_eq!(ledger.claimable_rewards(id), RewardAmount::ZERO);
    assert!(matches!(
        ledger.claim_rewards(&alice(), id),
        Err(LedgerError::RewardsStopped)
    ));

    // Accrual continued while the reserve was empty.
    w.clock.advance(DAY);
    w.reserve.deposit(units(1_000));
    let rest = ledger.claim_rewards(&alice(), id).unwrap();
    assert_eq!(rest.raw(), 2 * owed - 10 * REWARD_UNIT);
    assert_eq!(w.reserve.paid_to(&alice()).raw(), 2 * owed);
}

#[test]
fn scarce_reserve_drains_batch_in_listed_order() {
    let w = World::new();
    let mut ledger = w.ledger();
    let ids = w.mint_many(3, &alice());

    ledger.multi_enter(&alice(), &ids).unwrap();
    w.clock.advance(DAY);
    let each = BASE_RATE * DAY as u128;
    w.reserve.deposit(RewardAmount::new(each + each / 2));

    let order = [ids[2], ids[0], ids[1]];
    let receipt = ledger.multi_claim_rewards(&alice(), &order).unwrap();
    assert_eq!(receipt.paid[0], (ids[2], RewardAmount::new(each)));
    assert_eq!(receipt.paid[1], (ids[0], RewardAmount::new(each / 2)));
    assert_eq!(receipt.paid[2], (ids[1], RewardAmount::ZERO));
    assert_eq!(receipt.shortfall.raw(), 3 * each - (each + each / 2));

    assert_eq!(ledger.position(ids[2]).unwrap().accrued, RewardAmount::ZERO);
    assert_eq!(
        ledger.position(ids[0]).unwrap().accrued.raw(),
        each - each / 2
    );
    assert_eq!(ledger.position(ids[1]).unwrap().accrued.raw(), each);
}

#[test]
fn payouts_never_exceed_deposits_and_owed_is_conserved() {
    let w = World::new();
    let mut ledger = w.ledger();
    let ids = w.mint_many(5, &alice());
    ledger.multi_enter(&alice(), &ids).unwrap();

    for round in 0..6u128 {
        w.reserve.deposit(units(30 + round * 7));
        w.clock.advance(DAY / 3);
        let _ = ledger.multi_claim_rewards(&alice(), &ids);
        assert!(w.reserve.total_paid() <= w.reserve.total_deposited());
    }

    let elapsed = 6 * (DAY / 3);
    let integrated = BASE_RATE * elapsed as u128 * ids.len() as u128;
    let held: u128 = ids
        .iter()
        .map(|id| {
            let p = ledger.position(*id).unwrap();
            p.total_claimed.raw() + p.accrued.raw()
        })
        .sum();
    // Positions last settled at the final claim, which ran at `elapsed`.
    assert_eq!(held, integrated);
    assert_eq!(w.reserve.total_paid(), w.reserve.paid_to(&alice()));
    assert_eq!(
        w.reserve.total_paid().raw(),
        ids.iter()
            .map(|id| ledger.position(*id).unwrap().total_claimed.raw())
            .sum::<u128>()
    );
}

#[test]
fn claim_on_leave_pays_and_freezes() {
    let w = World::new();
    let mut ledger = w.ledger_with(LedgerConfig {
        genesis: 1_700_000_000,
        claim_on_leave: true,
        ..LedgerConfig::default()
    });
    w.reserve.deposit(units(1_000));
    let ids = w.mint_many(2, &alice());

    ledger.multi_enter(&alice(), &ids).unwrap();
    w.clock.advance(DAY);
    let paid = ledger.multi_leave(&alice(), &ids).unwrap();
    assert_eq!(paid.raw(), 2 * BASE_RATE * DAY as u128);
    assert_eq!(w.reserve.paid_to(&alice()), paid);
    assert!(ids.iter().all(|id| !ledger.is_active(*id)));
    assert_eq!(ledger.multi_claimable_rewards(&ids), RewardAmount::ZERO);
}

// ---------------------------------------------------------------------------
// Authorization and atomicity
// ---------------------------------------------------------------------------

#[test]
fn foreign_and_missing_positions_are_rejected_everywhere() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000));
    let mine = w.mint(1, &alice());
    let theirs = w.mint(2, &bob());
    let missing = PositionId::new(99);
    ledger.enter(&alice(), mine).unwrap();
    ledger.enter(&bob(), theirs).unwrap();
    w.clock.advance(DAY);

    assert!(matches!(
        ledger.enter(&alice(), missing),
        Err(LedgerError::NoSuchPosition(_))
    ));
    assert!(matches!(
        ledger.leave(&alice(), theirs),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(matches!(
        ledger.claim_rewards(&alice(), theirs),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(matches!(
        ledger.claim_rewards(&alice(), missing),
        Err(LedgerError::NoSuchPosition(_))
    ));

    let before_mine = ledger.position(mine).unwrap().clone();
    let before_theirs = ledger.position(theirs).unwrap().clone();
    assert!(matches!(
        ledger.multi_leave(&alice(), &[mine, theirs]),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(matches!(
        ledger.multi_claim_rewards(&alice(), &[mine, missing]),
        Err(LedgerError::NoSuchPosition(_))
    ));
    assert_eq!(ledger.position(mine).unwrap(), &before_mine);
    assert_eq!(ledger.position(theirs).unwrap(), &before_theirs);
    assert_eq!(w.reserve.total_paid(), RewardAmount::ZERO);
}

#[test]
fn transferred_position_follows_its_new_owner() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000));
    let id = w.mint(1, &alice());
    ledger.enter(&alice(), id).unwrap();
    w.clock.advance(DAY);

    assert!(w.oracle.transfer(id, bob()));
    assert!(matches!(
        ledger.claim_rewards(&alice(), id),
        Err(LedgerError::NotOwner { .. })
    ));
    let paid = ledger.claim_rewards(&bob(), id).unwrap();
    assert_eq!(paid.raw(), BASE_RATE * DAY as u128);

    w.oracle.burn(id);
    assert!(matches!(
        ledger.leave(&bob(), id),
        Err(LedgerError::NoSuchPosition(_))
    ));
}

#[test]
fn failed_batch_transfer_leaves_every_position_untouched() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(1_000));
    let ids = w.mint_many(4, &alice());
    ledger.multi_enter(&alice(), &ids).unwrap();
    w.clock.advance(DAY);

    let before: Vec<_> = ids
        .iter()
        .map(|id| ledger.position(*id).unwrap().clone())
        .collect();
    w.reserve.fail_transfers(true);
    assert!(matches!(
        ledger.multi_claim_rewards(&alice(), &ids),
        Err(LedgerError::Transfer(_))
    ));
    for (id, p) in ids.iter().zip(&before) {
        assert_eq!(ledger.position(*id).unwrap(), p);
    }
    assert_eq!(w.reserve.balance(), units(1_000));
}

#[test]
fn authority_controls_rate_and_reserve() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(500));

    assert!(matches!(
        ledger.set_rewards_rate(&alice(), units(1)),
        Err(LedgerError::NotAuthority)
    ));
    assert!(matches!(
        ledger.withdraw_reserve(&alice()),
        Err(LedgerError::NotAuthority)
    ));

    assert_eq!(ledger.withdraw_reserve(&authority()).unwrap(), units(500));
    assert_eq!(w.reserve.paid_to(&authority()), units(500));
    assert_eq!(w.reserve.balance(), RewardAmount::ZERO);
}

#[test]
fn rate_aggregation_counts_listed_ids() {
    let w = World::new();
    let mut ledger = w.ledger();
    let ids = w.mint_many(3, &alice());
    ledger.enter(&alice(), ids[0]).unwrap();

    assert_eq!(
        ledger.multi_rewards_rate_per_second(&ids).unwrap().raw(),
        3 * BASE_RATE
    );
    assert_eq!(
        ledger
            .multi_rewards_rate_per_second(&[ids[0], ids[0]])
            .unwrap()
            .raw(),
        BASE_RATE
    );
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn ledger_survives_save_and_restore() {
    let w = World::new();
    let mut ledger = w.ledger();
    w.reserve.deposit(units(10_000));
    let ids = w.mint_many(10, &alice());
    ledger.multi_enter(&alice(), &ids).unwrap();
    w.clock.advance(DAY);
    ledger
        .set_rewards_rate(&authority(), RewardAmount::new(BASE_RATE * 2))
        .unwrap();
    ledger.multi_leave(&alice(), &ids[..5]).unwrap();

    let store = NullLedgerStore::new();
    ledger.save_to_store(&store).unwrap();

    let mut restored = w.ledger();
    restored.restore_from_store(&store).unwrap();
    w.clock.advance(DAY);

    assert_eq!(restored.registry().len(), 10);
    assert_eq!(
        restored.multi_claimable_rewards(&ids),
        ledger.multi_claimable_rewards(&ids)
    );
    assert_eq!(
        restored.claimable_rewards(ids[9]).raw(),
        BASE_RATE * DAY as u128 + 2 * BASE_RATE * DAY as u128
    );
}
