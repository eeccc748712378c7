use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::interest::elapsed_seconds;
use crate::terms::Terms;

/// late fee and prepayment penalty parameters of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PenaltyConfig {
    /// flat fee charged once when the due date plus grace has passed
    pub late_fee: Money,
    pub grace_period_secs: u64,
    /// flat penalty on full repayment inside the prepayment window
    pub prepayment_penalty: Money,
    pub prepayment_period_secs: u64,
    /// decay the penalty linearly to zero across the window
    pub sliding_scale: bool,
}

impl PenaltyConfig {
    pub fn from_terms(terms: &Terms) -> Self {
        Self {
            late_fee: terms.late_fee,
            grace_period_secs: terms.grace_period,
            prepayment_penalty: terms.prepayment_penalty,
            prepayment_period_secs: terms.prepayment_period,
            sliding_scale: terms.sliding_scale_prepayment_penalty,
        }
    }
}

/// engine for late fees and prepayment penalties
pub struct PenaltyEngine {
    pub config: PenaltyConfig,
}

impl PenaltyEngine {
    pub fn new(config: PenaltyConfig) -> Self {
        Self { config }
    }

    /// true once more than the grace period has elapsed past `due_date`
    pub fn is_past_grace(&self, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now > due_date && elapsed_seconds(due_date, now) > self.config.grace_period_secs
    }

    /// late fee owed at `now`; zero if already charged or still inside grace
    pub fn late_fee_due(&self, due_date: DateTime<Utc>, now: DateTime<Utc>, already_charged: bool) -> Money {
        if already_charged || self.config.late_fee.is_zero() || !self.is_past_grace(due_date, now) {
            return Money::ZERO;
        }
        self.config.late_fee
    }

    /// true while `now` is strictly before `issuance + prepayment_period`
    pub fn in_prepayment_window(&self, issuance: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        elapsed_seconds(issuance, now) < self.config.prepayment_period_secs
    }

    /// Penalty for a full repayment at `now`.
    ///
    /// Sliding scale: `penalty * (period - elapsed) / period`, truncated.
    pub fn prepayment_penalty(&self, issuance: DateTime<Utc>, now: DateTime<Utc>) -> Result<Money> {
        if self.config.prepayment_penalty.is_zero() || !self.in_prepayment_window(issuance, now) {
            return Ok(Money::ZERO);
        }

        if !self.config.sliding_scale {
            return Ok(self.config.prepayment_penalty);
        }

        let period = self.config.prepayment_period_secs;
        let remaining = period - elapsed_seconds(issuance, now);
        let penalty = self.config.prepayment_penalty;
        if let Some(scaled) = penalty.mul_div(remaining as u128, period as u128) {
            return Ok(scaled);
        }

        // too large to scale exactly, apply the remaining fraction instead
        Decimal::from(remaining)
            .checked_div(Decimal::from(period))
            .zip(penalty.to_decimal())
            .and_then(|(fraction, amount)| amount.checked_mul(fraction))
            .and_then(Money::from_decimal_trunc)
            .ok_or_else(|| LoanError::overflow("prepayment penalty"))
    }
}
