//! Reward amount type.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid floating-point errors.
//! The smallest unit is 1 raw; one whole reward unit is `REWARD_UNIT` raw.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional decimal digits in one reward unit.
pub const REWARD_DECIMALS: u32 = 18;

/// Raw units per whole reward unit.
pub const REWARD_UNIT: u128 = 10u128.pow(REWARD_DECIMALS);

/// Amount of reward, or reward per second when used as a rate.
///
/// Internally stored as raw units (u128) for precision.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RewardAmount(u128);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountParseError {
    #[error("amount string is empty")]
    Empty,

    #[error("invalid character in amount: {0:?}")]
    InvalidDigit(char),

    #[error("more than 18 fractional digits")]
    TooManyDecimals,

    #[error("amount does not fit in 128 bits")]
    Overflow,
}

impl RewardAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// `units` whole reward units.
    pub fn from_units(units: u128) -> Option<Self> {
        units.checked_mul(REWARD_UNIT).map(Self)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn checked_mul(self, factor: u128) -> Option<Self> {
        self.0.checked_mul(factor).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal string such as `"0.000578703703703703"`.
    ///
    /// Fractional digits beyond `REWARD_DECIMALS` are rejected, not rounded.
    pub fn from_decimal_str(s: &str) -> Result<Self, AmountParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if frac.len() > REWARD_DECIMALS as usize {
            return Err(AmountParseError::TooManyDecimals);
        }

        let mut raw: u128 = 0;
        for c in whole.chars().chain(frac.chars()) {
            let digit = c.to_digit(10).ok_or(AmountParseError::InvalidDigit(c))?;
            raw = raw
                .checked_mul(10)
                .and_then(|r| r.checked_add(digit as u128))
                .ok_or(AmountParseError::Overflow)?;
        }
        let pad = REWARD_DECIMALS - frac.len() as u32;
        raw = raw
            .checked_mul(10u128.pow(pad))
            .ok_or(AmountParseError::Overflow)?;
        Ok(Self(raw))
    }
}

impl FromStr for RewardAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_decimal_str(s)
    }
}

impl fmt::Display for RewardAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / REWARD_UNIT;
        let frac = self.0 % REWARD_UNIT;
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let digits = format!("{:0width$}", frac, width = REWARD_DECIMALS as usize);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}
