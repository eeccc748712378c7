use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// fixed-point scale applied to rates (1e18)
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// number of decimal places carried by a scaled rate
pub const RATE_DECIMALS: u32 = 18;

/// Amount in the smallest currency unit (wei, satoshi, cent).
///
/// Addition and subtraction saturate: an outstanding balance can reach zero
/// but never go below it, and no realistic sum reaches `u128::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(u128);

impl Money {
    pub const ZERO: Money = Money(0);
    pub const ONE: Money = Money(1);
    pub const MAX: Money = Money(u128::MAX);

    /// create from a count of base units
    pub const fn new(units: u128) -> Self {
        Money(units)
    }

    /// raw base units
    pub const fn units(&self) -> u128 {
        self.0
    }

    /// exact decimal representation, `None` above the 96-bit decimal range
    pub fn to_decimal(&self) -> Option<Decimal> {
        let units = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(units, 0).ok()
    }

    /// truncate a non-negative decimal toward zero into base units
    pub fn from_decimal_trunc(d: Decimal) -> Option<Self> {
        if d.is_sign_negative() && !d.is_zero() {
            return None;
        }
        d.trunc().to_u128().map(Money)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// `self * numerator / denominator`, truncated; `None` on overflow or a zero denominator
    pub fn mul_div(self, numerator: u128, denominator: u128) -> Option<Money> {
        if denominator == 0 {
            return None;
        }
        let value = self.to_decimal()?
            .checked_mul(Decimal::try_from_i128_with_scale(i128::try_from(numerator).ok()?, 0).ok()?)?
            .checked_div(Decimal::try_from_i128_with_scale(i128::try_from(denominator).ok()?, 0).ok()?)?;
        Money::from_decimal_trunc(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Money)
    }
}

impl From<u128> for Money {
    fn from(units: u128) -> Self {
        Money(units)
    }
}

impl From<u64> for Money {
    fn from(units: u64) -> Self {
        Money(units as u128)
    }
}

impl From<u32> for Money {
    fn from(units: u32) -> Self {
        Money(units as u128)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

/// Annual percentage rate in percentage points, scaled by 1e18.
///
/// `Rate::from_scaled(5_167_250_000_000_000_000)` is 5.16725 % APR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Rate(u128);

impl Rate {
    pub const ZERO: Rate = Rate(0);

    /// create from a raw 1e18-scaled value
    pub const fn from_scaled(scaled: u128) -> Self {
        Rate(scaled)
    }

    /// create from whole percentage points (e.g., 5 for 5%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(p as u128 * WAD)
    }

    /// create from basis points (e.g., 500 for 5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(bps as u128 * (WAD / 100))
    }

    /// create from a decimal percentage (e.g., 5.16725), truncating below 1e-18
    pub fn from_percent_decimal(p: Decimal) -> Option<Self> {
        if p.is_sign_negative() && !p.is_zero() {
            return None;
        }
        let scaled = p.checked_mul(Decimal::from(WAD as u64))?;
        scaled.trunc().to_u128().map(Rate)
    }

    /// raw 1e18-scaled value
    pub const fn as_scaled(&self) -> u128 {
        self.0
    }

    /// exact percentage as a decimal, `None` above the 96-bit decimal range
    pub fn as_percentage(&self) -> Option<Decimal> {
        let scaled = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(scaled, RATE_DECIMALS).ok()
    }

    /// rate as a fraction of one (5% -> 0.05)
    pub fn as_fraction(&self) -> Option<Decimal> {
        self.as_percentage()?.checked_div(Decimal::ONE_HUNDRED)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_percentage() {
            Some(p) => write!(f, "{}%", p.normalize()),
            None => write!(f, "{}e-18%", self.0),
        }
    }
}
