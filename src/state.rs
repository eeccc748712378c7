use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::interest::CarriedBalance;
use crate::types::{BalanceBreakdown, LoanId, LoanStatus, PaymentApplication};

/// mutable state of one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanState {
    pub loan_id: LoanId,
    pub status: LoanStatus,

    // core balances
    pub principal_outstanding: Money,
    pub accrued_interest: Money,
    /// part of `accrued_interest` not yet compounded into the base
    pub uncapitalized_interest: Money,
    pub accrued_fees: Money,

    // dates
    pub created_at: DateTime<Utc>,
    pub issuance_time: Option<DateTime<Utc>>,
    /// start of the current interest accrual window
    pub last_payment_time: Option<DateTime<Utc>>,
    pub last_status_change: DateTime<Utc>,

    // collateral
    pub collateral_pledged: Money,
    pub collateral_held: Money,

    /// principal taken from the lender and not yet disbursed
    pub escrowed_principal: Money,

    pub late_fee_charged: bool,
    pub prepayment_penalty_charged: bool,
    /// balance captured on entering Defaulted
    pub frozen_balance: Option<Money>,

    // payment tracking
    pub total_paid: Money,
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
    pub total_fees_paid: Money,
    pub total_fees_charged: Money,
    pub last_payment_amount: Option<Money>,
    pub payment_count: u32,
}

impl LoanState {
    pub fn new(loan_id: LoanId, created_at: DateTime<Utc>) -> Self {
        Self {
            loan_id,
            status: LoanStatus::Created,
            principal_outstanding: Money::ZERO,
            accrued_interest: Money::ZERO,
            uncapitalized_interest: Money::ZERO,
            accrued_fees: Money::ZERO,
            created_at,
            issuance_time: None,
            last_payment_time: None,
            last_status_change: created_at,
            collateral_pledged: Money::ZERO,
            collateral_held: Money::ZERO,
            escrowed_principal: Money::ZERO,
            late_fee_charged: false,
            prepayment_penalty_charged: false,
            frozen_balance: None,
            total_paid: Money::ZERO,
            total_principal_paid: Money::ZERO,
            total_interest_paid: Money::ZERO,
            total_fees_paid: Money::ZERO,
            total_fees_charged: Money::ZERO,
            last_payment_amount: None,
            payment_count: 0,
        }
    }

    /// balances as last recorded, without interest accrued since
    pub fn recorded_balance(&self) -> BalanceBreakdown {
        BalanceBreakdown {
            principal: self.principal_outstanding,
            interest: self.accrued_interest,
            fees: self.accrued_fees,
        }
    }

    /// interest-bearing part of the recorded balance
    pub fn carried_balance(&self) -> CarriedBalance {
        CarriedBalance::new(
            self.principal_outstanding,
            self.accrued_interest,
            self.uncapitalized_interest,
        )
    }

    /// record balances as of the last accrual point
    pub fn set_balance(&mut self, balance: BalanceBreakdown, uncapitalized: Money) {
        let carried = CarriedBalance::new(balance.principal, balance.interest, uncapitalized);
        self.principal_outstanding = carried.principal;
        self.accrued_interest = carried.interest;
        self.uncapitalized_interest = carried.uncapitalized;
        self.accrued_fees = balance.fees;
    }

    /// update status
    pub fn update_status(&mut self, new_status: LoanStatus, timestamp: DateTime<Utc>) {
        self.status = new_status;
        self.last_status_change = timestamp;
    }

    /// record payment
    pub fn record_payment(&mut self, application: &PaymentApplication, timestamp: DateTime<Utc>) {
        let applied = application.total_applied();
        self.total_paid += applied;
        self.total_principal_paid += application.to_principal;
        self.total_interest_paid += application.to_interest;
        self.total_fees_paid += application.to_fees;
        self.last_payment_amount = Some(applied);
        self.last_payment_time = Some(timestamp);
        self.payment_count += 1;
    }

    /// collateral currently pledged or locked
    pub fn collateral_exposure(&self) -> Money {
        self.collateral_pledged + self.collateral_held
    }
}

/// state snapshot for audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub snapshot_id: Uuid,
    pub loan_id: LoanId,
    pub timestamp: DateTime<Utc>,
    pub state: LoanState,
    pub trigger: String,
}

impl StateSnapshot {
    pub fn capture(state: &LoanState, trigger: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            loan_id: state.loan_id,
            timestamp,
            state: state.clone(),
            trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_payment_totals() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut state = LoanState::new(Uuid::new_v4(), now);

        state.record_payment(
            &PaymentApplication {
                to_fees: Money::new(10),
                to_interest: Money::new(20),
                to_principal: Money::new(70),
                excess: Money::new(5),
            },
            now,
        );

        assert_eq!(state.total_paid, Money::new(100));
        assert_eq!(state.total_principal_paid, Money::new(70));
        assert_eq!(state.last_payment_amount, Some(Money::new(100)));
        assert_eq!(state.last_payment_time, Some(now));
        assert_eq!(state.payment_count, 1);
    }

    #[test]
    fn test_paid_interest_shrinks_uncapitalized_part() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut state = LoanState::new(Uuid::new_v4(), now);
        let balance = BalanceBreakdown {
            principal: Money::new(1_000),
            interest: Money::new(40),
            fees: Money::ZERO,
        };

        state.set_balance(balance, Money::new(60));
        assert_eq!(state.uncapitalized_interest, Money::new(40));
        assert_eq!(state.carried_balance().principal, Money::new(1_000));
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut state = LoanState::new(Uuid::new_v4(), now);
        let snapshot = StateSnapshot::capture(&state, "created".to_string(), now);

        state.update_status(LoanStatus::TermsSet, now);
        assert_eq!(snapshot.state.status, LoanStatus::Created);
        assert_eq!(snapshot.loan_id, state.loan_id);
    }
}
