#![no_main]

use libfuzzer_sys::fuzz_target;

use drip_accrual::RateSchedule;
use drip_types::{RewardAmount, Timestamp};

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

// Integrate arbitrary rate schedules over arbitrary windows.
// Layout: initial rate, window start, window end, then 16-byte
// (rate, seconds since previous change) records.
// Must never panic, and checked integration must agree with the lossy one.
fuzz_target!(|data: &[u8]| {
    if data.len() < 24 {
        return;
    }
    let initial_rate = RewardAmount::new(read_u64(&data[0..]) as u128);
    let from = Timestamp::new(read_u64(&data[8..]));
    let to = Timestamp::new(read_u64(&data[16..]));

    let mut schedule = RateSchedule::new(initial_rate, Timestamp::EPOCH);
    let mut at = Timestamp::EPOCH;
    for record in data[24..].chunks_exact(16) {
        let rate = RewardAmount::new(read_u64(record) as u128);
        at = at.plus(read_u64(&record[8..]).min(100_000));
        // Changes at the current segment start replace it; none go backwards.
        schedule.apply_rate_change(rate, at).unwrap();
    }

    let lossy = schedule.accrued_between(from, to);
    match schedule.accrued_between_checked(from, to) {
        Some(checked) => assert_eq!(checked, lossy),
        None => assert_eq!(lossy, RewardAmount::ZERO),
    }
    if to <= from {
        assert_eq!(lossy, RewardAmount::ZERO);
    }
});
