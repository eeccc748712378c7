//! serialization support for loans
use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::agreement::LoanAgreement;
use crate::decimal::Money;
use crate::errors::Result;
use crate::terms::Terms;
use crate::types::{LoanId, LoanStatus, PartyId};

/// serializable view of a loan at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub lender: PartyId,
    pub status: LoanStatus,
    pub as_of: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub issuance_time: Option<DateTime<Utc>>,
    pub maturity_date: Option<DateTime<Utc>>,
    pub default_deadline: Option<DateTime<Utc>>,
    pub terms: Option<Terms>,
    pub balance: BalanceView,
    pub payments: PaymentView,
    pub collateral: CollateralView,
    pub metadata: MetadataView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub principal: Money,
    pub interest: Money,
    pub fees: Money,
    pub total_outstanding: Money,
    /// added on top of `total_outstanding` by a payoff at `as_of`
    pub prepayment_penalty: Money,
    pub payoff: Money,
    pub frozen: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub total_paid: Money,
    pub total_principal_paid: Money,
    pub total_interest_paid: Money,
    pub total_fees_paid: Money,
    pub total_fees_charged: Money,
    pub last_payment_time: Option<DateTime<Utc>>,
    pub last_payment_amount: Option<Money>,
    pub payment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralView {
    pub pledged: Money,
    pub held: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataView {
    pub interest_method: String,
    pub day_count_convention: String,
    /// apr in percent, absent before terms are set
    pub apr_percent: Option<Decimal>,
}

impl LoanView {
    pub fn capture(loan: &LoanAgreement, time_provider: &SafeTimeProvider) -> Result<Self> {
        let as_of = time_provider.now();
        let balance = loan.balance_breakdown(time_provider)?;
        let prepayment_penalty = loan.pending_prepayment_penalty(time_provider)?;
        let state = loan.state();
        let terms = loan.get_terms().ok().cloned();

        Ok(LoanView {
            id: loan.id(),
            lender: loan.lender().clone(),
            status: state.status,
            as_of,
            created_at: state.created_at,
            issuance_time: state.issuance_time,
            maturity_date: loan.maturity_date(),
            default_deadline: loan.default_deadline(),
            balance: BalanceView {
                principal: balance.principal,
                interest: balance.interest,
                fees: balance.fees,
                total_outstanding: balance.total(),
                prepayment_penalty,
                payoff: balance.total() + prepayment_penalty,
                frozen: state.frozen_balance,
            },
            payments: PaymentView {
                total_paid: state.total_paid,
                total_principal_paid: state.total_principal_paid,
                total_interest_paid: state.total_interest_paid,
                total_fees_paid: state.total_fees_paid,
                total_fees_charged: state.total_fees_charged,
                last_payment_time: state.last_payment_time,
                last_payment_amount: state.last_payment_amount,
                payment_count: state.payment_count,
            },
            collateral: CollateralView {
                pledged: state.collateral_pledged,
                held: state.collateral_held,
            },
            metadata: MetadataView {
                interest_method: format!("{:?}", loan.config().interest.method),
                day_count_convention: format!("{:?}", loan.config().interest.day_count),
                apr_percent: terms.as_ref().and_then(|t| t.apr.as_percentage()),
            },
            terms,
        })
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::terms::TermSheet;
    use chrono::TimeZone;
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    #[test]
    fn test_view_round_trips_through_json() {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let control = time.test_control().unwrap();
        let lender = PartyId::from("lender");

        let mut loan = LoanAgreement::new(lender.clone(), &time);
        let sheet = TermSheet::builder()
            .borrower("borrower")
            .principal(Money::new(1_000_000))
            .apr(Rate::from_percent_decimal(dec!(7.5)).unwrap())
            .term(86_400 * 365)
            .build()
            .unwrap();
        loan.set_terms(&lender, sheet, &time).unwrap();
        loan.fund_and_issue_loan(&lender, Money::new(1_000_000), &time).unwrap();
        control.advance(chrono::Duration::days(73));

        let view = loan.to_view(&time).unwrap();
        assert_eq!(view.status, LoanStatus::Active);
        assert_eq!(view.balance.interest, Money::new(15_000));
        assert_eq!(view.balance.total_outstanding, Money::new(1_015_000));
        assert_eq!(view.balance.payoff, Money::new(1_015_000));
        assert_eq!(view.metadata.apr_percent, Some(dec!(7.5)));

        let json = view.to_json_pretty().unwrap();
        let parsed: LoanView = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, view);
        assert_eq!(loan.to_json_pretty(&time).unwrap(), json);
    }

    #[test]
    fn test_view_before_terms() {
        let time = SafeTimeProvider::new(TimeSource::System);
        let loan = LoanAgreement::new("lender", &time);

        let view = LoanView::capture(&loan, &time).unwrap();
        assert!(view.terms.is_none());
        assert!(view.metadata.apr_percent.is_none());
        assert_eq!(view.balance.total_outstanding, Money::ZERO);
    }
}
