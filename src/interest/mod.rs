pub mod accrual;
pub mod compound;
pub mod penalty;

use chrono::{DateTime, Utc};

use crate::config::{InterestConfig, InterestMethod};
use crate::decimal::{Money, Rate};
use crate::errors::Result;

pub use accrual::{AccrualEngine, DayCountConvention};
pub use compound::{CompoundingEngine, CompoundingFrequency};
pub use penalty::{PenaltyConfig, PenaltyEngine};

/// interest calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub interest_amount: Money,
    pub elapsed_secs: u64,
    pub principal_base: Money,
    pub calculation_method: String,
}

/// Ceiling on unpaid interest, in base units.
///
/// Accrual saturates here instead of failing so a runaway loan can still be
/// read, paid and defaulted.
pub const INTEREST_CAP: Money = Money::new(10_000_000_000_000_000_000_000_000_000);

/// interest-bearing balance carried from one accrual point to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarriedBalance {
    pub principal: Money,
    /// all unpaid interest
    pub interest: Money,
    /// the part of `interest` accrued in the current compounding period,
    /// always zero under simple interest
    pub uncapitalized: Money,
}

impl CarriedBalance {
    /// Capitalized interest is the older debt and is paid first, so the
    /// uncapitalized part never exceeds what interest remains.
    pub fn new(principal: Money, interest: Money, uncapitalized: Money) -> Self {
        Self {
            principal,
            interest,
            uncapitalized: uncapitalized.min(interest),
        }
    }
}

/// trait for interest calculations
pub trait InterestCalculator {
    fn calculate_interest(
        &self,
        principal: Money,
        rate: Rate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<InterestCalculation>;

    /// Roll `carried` forward from `since` to `now`.
    ///
    /// `anchor` is the instant accrual started; period boundaries are counted
    /// from it. Simple interest accrues on principal alone.
    fn accrue(
        &self,
        carried: CarriedBalance,
        rate: Rate,
        _anchor: DateTime<Utc>,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<CarriedBalance> {
        let accrued = self.calculate_interest(carried.principal, rate, since, now)?;
        Ok(CarriedBalance {
            interest: (carried.interest + accrued.interest_amount).min(INTEREST_CAP),
            uncapitalized: Money::ZERO,
            ..carried
        })
    }
}

/// calculator selected by an interest configuration
pub fn calculator_for(config: &InterestConfig) -> Box<dyn InterestCalculator + Send + Sync> {
    match config.method {
        InterestMethod::Simple => Box::new(AccrualEngine::new(config.day_count)),
        InterestMethod::Compound(frequency) => {
            Box::new(CompoundingEngine::new(frequency, config.day_count))
        }
    }
}

/// whole seconds from `start` to `end`, zero when `end` is not after `start`
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_seconds().max(0) as u64
}
