#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use drip_accrual::{LedgerConfig, RewardLedger};
use drip_nullables::{NullClock, NullOwnership, NullReserve};
use drip_types::{Identity, PositionId, RewardAmount, RewardReserve};

#[derive(Arbitrary, Debug)]
enum Op {
    Advance(u16),
    Deposit(u32),
    Enter { owner: bool, id: u8 },
    Leave { owner: bool, id: u8 },
    Claim { owner: bool, id: u8 },
    MultiClaim { owner: bool, ids: Vec<u8> },
    SetRate(u32),
    Transfer { id: u8 },
}

fn caller(owner: bool) -> Identity {
    Identity::new(if owner { "alice" } else { "bob" })
}

// Drive arbitrary operation sequences through the ledger.
// The reserve must never pay out more than was deposited, and a rejected
// operation must not change the position it named.
fuzz_target!(|ops: Vec<Op>| {
    let oracle = NullOwnership::new();
    let reserve = NullReserve::new();
    let clock = NullClock::new(0);
    for id in 0..8u64 {
        oracle.mint(PositionId::new(id), caller(true));
    }
    let config = LedgerConfig::default();
    let Ok(mut ledger) = RewardLedger::new(config, &oracle, &reserve, &clock) else {
        return;
    };
    let authority = ledger.authority().clone();

    for op in ops {
        match op {
            Op::Advance(secs) => clock.advance(secs as u64),
            Op::Deposit(raw) => reserve.deposit(RewardAmount::new(raw as u128 * 1_000_000)),
            Op::Enter { owner, id } => {
                let id = PositionId::new(id as u64 % 10);
                let before = ledger.position(id).cloned();
                if ledger.enter(&caller(owner), id).is_err() {
                    assert_eq!(ledger.position(id).cloned(), before);
                }
            }
            Op::Leave { owner, id } => {
                let id = PositionId::new(id as u64 % 10);
                let before = ledger.position(id).cloned();
                if ledger.leave(&caller(owner), id).is_err() {
                    assert_eq!(ledger.position(id).cloned(), before);
                }
            }
            Op::Claim { owner, id } => {
                let id = PositionId::new(id as u64 % 10);
                let before = ledger.position(id).cloned();
                if ledger.claim_rewards(&caller(owner), id).is_err() {
                    assert_eq!(ledger.position(id).cloned(), before);
                }
            }
            Op::MultiClaim { owner, ids } => {
                let ids: Vec<_> = ids.iter().map(|i| PositionId::new(*i as u64 % 10)).collect();
                let _ = ledger.multi_claim_rewards(&caller(owner), &ids);
            }
            Op::SetRate(raw) => {
                let _ = ledger.set_rewards_rate(&authority, RewardAmount::new(raw as u128 * 1_000));
            }
            Op::Transfer { id } => {
                oracle.transfer(PositionId::new(id as u64 % 10), caller(false));
            }
        }
        assert!(reserve.total_paid() <= reserve.total_deposited());
        assert_eq!(
            reserve.balance().raw() + reserve.total_paid().raw(),
            reserve.total_deposited().raw()
        );
    }
});
