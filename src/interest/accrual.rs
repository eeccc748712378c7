use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::interest::{elapsed_seconds, InterestCalculation, InterestCalculator, INTEREST_CAP};

/// day count convention, expressed as the length of the accrual year in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, Default)]
pub enum DayCountConvention {
    /// elapsed seconds / 365 days
    #[default]
    Actual365,
    /// elapsed seconds / 360 days
    Actual360,
}

impl DayCountConvention {
    pub fn year_seconds(&self) -> u64 {
        match self {
            DayCountConvention::Actual365 => 365 * 86_400,
            DayCountConvention::Actual360 => 360 * 86_400,
        }
    }
}

/// engine for simple interest accrual
pub struct AccrualEngine {
    pub convention: DayCountConvention,
}

impl AccrualEngine {
    pub fn new(convention: DayCountConvention) -> Self {
        Self { convention }
    }

    /// Simple interest `principal * apr/100 * elapsed / year`.
    ///
    /// The rate factor is formed first so the intermediate stays inside the
    /// decimal range for large principals; the result is truncated toward zero
    /// and saturates at [`INTEREST_CAP`].
    pub fn simple_interest(&self, principal: Money, apr: Rate, elapsed_secs: u64) -> Result<Money> {
        if principal.is_zero() || apr.is_zero() || elapsed_secs == 0 {
            return Ok(Money::ZERO);
        }

        let factor = accrual_factor(apr, elapsed_secs, self.convention.year_seconds())?;
        let base = principal
            .to_decimal()
            .ok_or_else(|| LoanError::overflow("principal conversion"))?;

        Ok(base
            .checked_mul(factor)
            .and_then(Money::from_decimal_trunc)
            .map_or(INTEREST_CAP, |interest| interest.min(INTEREST_CAP)))
    }
}

/// `apr/100 * elapsed / year` as a decimal
pub(crate) fn accrual_factor(apr: Rate, elapsed_secs: u64, year_secs: u64) -> Result<Decimal> {
    let percent = apr
        .as_percentage()
        .ok_or_else(|| LoanError::overflow("rate conversion"))?;
    let year_hundredths = Decimal::from(year_secs)
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| LoanError::overflow("year basis"))?;

    percent
        .checked_mul(Decimal::from(elapsed_secs))
        .and_then(|v| v.checked_div(year_hundredths))
        .ok_or_else(|| LoanError::overflow("accrual factor"))
}

impl InterestCalculator for AccrualEngine {
    fn calculate_interest(
        &self,
        principal: Money,
        rate: Rate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<InterestCalculation> {
        let elapsed_secs = elapsed_seconds(start, end);
        let interest_amount = self.simple_interest(principal, rate, elapsed_secs)?;

        Ok(InterestCalculation {
            interest_amount,
            elapsed_secs,
            principal_base: principal,
            calculation_method: format!("Simple {:?}", self.convention),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::WAD;

    const YEAR: u64 = 31_536_000;

    fn exact_simple(principal: u128, apr_scaled: u128, elapsed: u64, year: u64) -> u128 {
        principal * apr_scaled * elapsed as u128 / (100 * WAD * year as u128)
    }

    #[test]
    fn test_full_year_simple_interest() {
        let engine = AccrualEngine::new(DayCountConvention::Actual365);
        let interest = engine
            .simple_interest(Money::new(10_000), Rate::from_percentage(5), YEAR)
            .unwrap();
        assert_eq!(interest, Money::new(500));
    }

    #[test]
    fn test_actual_360_accrues_faster() {
        let principal = Money::new(1_000_000_000);
        let rate = Rate::from_percentage(6);
        let a365 = AccrualEngine::new(DayCountConvention::Actual365)
            .simple_interest(principal, rate, 86_400 * 30)
            .unwrap();
        let a360 = AccrualEngine::new(DayCountConvention::Actual360)
            .simple_interest(principal, rate, 86_400 * 30)
            .unwrap();
        assert!(a360 > a365);
    }

    #[test]
    fn test_truncation_error_bounded_by_one_unit() {
        let engine = AccrualEngine::new(DayCountConvention::Actual365);
        let apr = 5_167_250_000_000_000_000u128;
        for (principal, elapsed) in [
            (100_000u128, 1u64),
            (100_000, 86_400),
            (123_456_789, 7_777_777),
            (999_999_999, YEAR * 3 + 17),
            (1, YEAR * 100),
        ] {
            let computed = engine
                .simple_interest(Money::new(principal), Rate::from_scaled(apr), elapsed)
                .unwrap()
                .units();
            let exact = exact_simple(principal, apr, elapsed, YEAR);
            assert!(computed <= exact, "rounded up for {} / {}", principal, elapsed);
            assert!(exact - computed <= 1, "drift for {} / {}", principal, elapsed);
        }
    }

    #[test]
    fn test_short_window_truncates_to_zero() {
        let engine = AccrualEngine::new(DayCountConvention::Actual365);
        let interest = engine
            .simple_interest(
                Money::new(100_000),
                Rate::from_scaled(5_167_250_000_000_000_000),
                2,
            )
            .unwrap();
        assert_eq!(interest, Money::ZERO);
    }

    #[test]
    fn test_monotonic_in_elapsed_time() {
        let engine = AccrualEngine::new(DayCountConvention::Actual365);
        let principal = Money::new(50_000_000);
        let rate = Rate::from_bps(1_250);
        let mut previous = Money::ZERO;
        for elapsed in (0..=YEAR).step_by(86_400 * 7) {
            let interest = engine.simple_interest(principal, rate, elapsed).unwrap();
            assert!(interest >= previous);
            previous = interest;
        }
    }

    #[test]
    fn test_large_principal_does_not_overflow() {
        let engine = AccrualEngine::new(DayCountConvention::Actual365);
        let principal = Money::new(1_000_000_000_000_000_000_000_000_000);
        let interest = engine
            .simple_interest(principal, Rate::from_percentage(10), YEAR)
            .unwrap();
        assert_eq!(interest, Money::new(100_000_000_000_000_000_000_000_000));
    }

    #[test]
    fn test_runaway_interest_saturates() {
        let engine = AccrualEngine::new(DayCountConvention::Actual365);
        let principal = Money::new(1_000_000_000_000_000_000_000_000_000);
        let rate = Rate::from_percentage(1_000);

        // 1e27 * 10 * 8 does not fit in a decimal
        let interest = engine.simple_interest(principal, rate, YEAR * 8).unwrap();
        assert_eq!(interest, INTEREST_CAP);
        assert_eq!(engine.simple_interest(principal, rate, YEAR / 2).unwrap(), Money::new(5_000_000_000_000_000_000_000_000_000));
    }
}
