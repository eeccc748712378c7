use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest::accrual::{accrual_factor, DayCountConvention};
use crate::interest::{
    elapsed_seconds, CarriedBalance, InterestCalculation, InterestCalculator, INTEREST_CAP,
};

/// compounding frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompoundingFrequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl CompoundingFrequency {
    /// get number of compounding periods per year
    pub fn periods_per_year(&self) -> u32 {
        match self {
            CompoundingFrequency::Daily => 365,
            CompoundingFrequency::Weekly => 52,
            CompoundingFrequency::Monthly => 12,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::SemiAnnual => 2,
            CompoundingFrequency::Annual => 1,
        }
    }
}

/// engine for compound interest calculations
pub struct CompoundingEngine {
    pub frequency: CompoundingFrequency,
    pub convention: DayCountConvention,
}

impl CompoundingEngine {
    pub fn new(frequency: CompoundingFrequency, convention: DayCountConvention) -> Self {
        Self { frequency, convention }
    }

    /// length of one compounding period in seconds
    pub fn period_seconds(&self) -> u64 {
        self.convention.year_seconds() / self.frequency.periods_per_year() as u64
    }

    /// Interest over `elapsed_secs` from the start of a period: whole periods
    /// compound at `apr / n`, the trailing partial period accrues simply on
    /// the compounded balance. Saturates at [`INTEREST_CAP`].
    pub fn compound_interest(&self, principal: Money, apr: Rate, elapsed_secs: u64) -> Result<Money> {
        if principal.is_zero() || apr.is_zero() || elapsed_secs == 0 {
            return Ok(Money::ZERO);
        }

        let fresh = CarriedBalance::new(principal, Money::ZERO, Money::ZERO);
        Ok(self
            .roll(fresh, apr, elapsed_secs, self.period_seconds())
            .map_or(INTEREST_CAP, |rolled| rolled.interest))
    }

    /// Advance `carried` by `elapsed_secs`, where the next period boundary is
    /// `to_boundary` seconds away. `None` once interest passes the cap.
    fn roll(
        &self,
        carried: CarriedBalance,
        apr: Rate,
        elapsed_secs: u64,
        to_boundary: u64,
    ) -> Option<CarriedBalance> {
        let year_secs = self.convention.year_seconds();
        let period_secs = self.period_seconds();
        let accrue_on = |base: Decimal, secs: u64| -> Option<Decimal> {
            base.checked_mul(accrual_factor(apr, secs, year_secs).ok()?)
        };

        let principal = carried.principal.to_decimal()?;
        let capitalized = (carried.interest - carried.uncapitalized).to_decimal()?;
        let mut base = principal.checked_add(capitalized)?;
        let mut pending = carried.uncapitalized.to_decimal()?;

        if elapsed_secs < to_boundary {
            pending = pending.checked_add(accrue_on(base, elapsed_secs)?)?;
        } else {
            // close the current period, then run whole periods and the stub
            pending = pending.checked_add(accrue_on(base, to_boundary)?)?;
            base = base.checked_add(pending)?;

            let rest = elapsed_secs - to_boundary;
            let period_rate = accrual_factor(apr, period_secs, year_secs).ok()?;
            let growth = checked_pow(Decimal::ONE.checked_add(period_rate)?, rest / period_secs)?;
            base = base.checked_mul(growth)?;
            pending = accrue_on(base, rest % period_secs)?;
        }

        let interest = Money::from_decimal_trunc(base.checked_sub(principal)?.checked_add(pending)?)?;
        if interest > INTEREST_CAP {
            return None;
        }
        Some(CarriedBalance::new(
            carried.principal,
            interest,
            Money::from_decimal_trunc(pending)?,
        ))
    }
}

/// exponentiation by squaring with overflow detection
fn checked_pow(base: Decimal, mut exp: u64) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut factor = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.checked_mul(factor)?;
        }
        exp >>= 1;
        if exp > 0 {
            factor = factor.checked_mul(factor)?;
        }
    }
    Some(result)
}

impl InterestCalculator for CompoundingEngine {
    fn calculate_interest(
        &self,
        principal: Money,
        rate: Rate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<InterestCalculation> {
        let elapsed_secs = elapsed_seconds(start, end);
        let interest_amount = self.compound_interest(principal, rate, elapsed_secs)?;

        Ok(InterestCalculation {
            interest_amount,
            elapsed_secs,
            principal_base: principal,
            calculation_method: format!("Compound {:?} {:?}", self.frequency, self.convention),
        })
    }

    /// Periods are counted from `anchor`, so payments in between never reset
    /// the compounding clock, and unpaid interest from a closed period earns
    /// interest like principal.
    fn accrue(
        &self,
        carried: CarriedBalance,
        rate: Rate,
        anchor: DateTime<Utc>,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<CarriedBalance> {
        let elapsed_secs = elapsed_seconds(since, now);
        if rate.is_zero() || elapsed_secs == 0 {
            return Ok(carried);
        }

        let period_secs = self.period_seconds();
        let to_boundary = period_secs - elapsed_seconds(anchor, since) % period_secs;

        Ok(self
            .roll(carried, rate, elapsed_secs, to_boundary)
            .unwrap_or(CarriedBalance {
                interest: INTEREST_CAP,
                uncapitalized: Money::ZERO,
                ..carried
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    const YEAR: u64 = 31_536_000;

    #[test]
    fn test_monthly_compounding_one_year() {
        let engine = CompoundingEngine::new(CompoundingFrequency::Monthly, DayCountConvention::Actual365);
        let interest = engine
            .compound_interest(Money::new(1_000_000), Rate::from_percentage(12), YEAR)
            .unwrap();
        // 1_000_000 * (1.01^12 - 1) = 126_825.03
        assert_eq!(interest, Money::new(126_825));
    }

    #[test]
    fn test_annual_compounding_matches_simple_within_first_period() {
        let engine = CompoundingEngine::new(CompoundingFrequency::Annual, DayCountConvention::Actual365);
        let interest = engine
            .compound_interest(Money::new(10_000), Rate::from_percentage(5), YEAR / 2)
            .unwrap();
        assert_eq!(interest, Money::new(250));
    }

    #[test]
    fn test_monotonic_across_period_boundaries() {
        let engine = CompoundingEngine::new(CompoundingFrequency::Weekly, DayCountConvention::Actual365);
        let principal = Money::new(10_000_000_000);
        let rate = Rate::from_percentage(20);
        let period = engine.period_seconds();
        let mut previous = Money::ZERO;
        for k in 1..10 {
            for elapsed in [k * period - 1, k * period, k * period + 1] {
                let interest = engine.compound_interest(principal, rate, elapsed).unwrap();
                assert!(interest >= previous, "interest fell at {}", elapsed);
                previous = interest;
            }
        }
    }

    #[test]
    fn test_anchored_accrual_matches_uninterrupted_growth() {
        use chrono::Duration;

        let engine = CompoundingEngine::new(CompoundingFrequency::Monthly, DayCountConvention::Actual365);
        let rate = Rate::from_percentage(12);
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = anchor + Duration::days(365);

        // stop every 28 days without paying anything
        let mut carried = CarriedBalance::new(Money::new(1_000_000), Money::ZERO, Money::ZERO);
        let mut since = anchor;
        while since < end {
            let next = (since + Duration::days(28)).min(end);
            carried = engine.accrue(carried, rate, anchor, since, next).unwrap();
            since = next;
        }

        // within a few units of truncation per stop
        assert!(carried.interest <= Money::new(126_825));
        assert!(carried.interest >= Money::new(126_825 - 30));
    }

    #[test]
    fn test_unpaid_interest_from_closed_period_compounds() {
        let engine = CompoundingEngine::new(CompoundingFrequency::Annual, DayCountConvention::Actual365);
        let rate = Rate::from_percentage(10);
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let one_year = anchor + chrono::Duration::seconds(YEAR as i64);
        let two_years = anchor + chrono::Duration::seconds(2 * YEAR as i64);

        let carried = CarriedBalance::new(Money::new(1_000), Money::new(100), Money::ZERO);
        let rolled = engine.accrue(carried, rate, anchor, one_year, two_years).unwrap();
        assert_eq!(rolled.interest, Money::new(210));
    }

    #[test]
    fn test_compound_growth_saturates() {
        let engine = CompoundingEngine::new(CompoundingFrequency::Daily, DayCountConvention::Actual365);
        let interest = engine
            .compound_interest(Money::new(1_000_000), Rate::from_percentage(1_000_000), YEAR)
            .unwrap();
        assert_eq!(interest, INTEREST_CAP);
    }

    #[test]
    fn test_checked_pow() {
        assert_eq!(checked_pow(dec!(1.1), 0), Some(Decimal::ONE));
        assert_eq!(checked_pow(dec!(2), 10), Some(dec!(1024)));
        assert_eq!(checked_pow(dec!(1000), 20), None);
    }
}
