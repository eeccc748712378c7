pub mod waterfall;

use chrono::{DateTime, Utc};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::{BalanceBreakdown, LoanId, PartyId};

pub use waterfall::{PaymentComponent, PaymentProcessor, PaymentResult, PaymentWaterfall};

/// payment request
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub loan_id: LoanId,
    pub payer: PartyId,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
}

/// payment context with current balances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentContext {
    pub loan_id: LoanId,
    pub accrued_fees: Money,
    pub accrued_interest: Money,
    pub principal_outstanding: Money,
}

impl PaymentContext {
    pub fn from_balance(loan_id: LoanId, balance: BalanceBreakdown) -> Self {
        Self {
            loan_id,
            accrued_fees: balance.fees,
            accrued_interest: balance.interest,
            principal_outstanding: balance.principal,
        }
    }

    pub fn balance(&self) -> BalanceBreakdown {
        BalanceBreakdown {
            principal: self.principal_outstanding,
            interest: self.accrued_interest,
            fees: self.accrued_fees,
        }
    }

    pub fn total_outstanding(&self) -> Money {
        self.accrued_fees + self.accrued_interest + self.principal_outstanding
    }

    pub fn validate_payment(&self, amount: Money) -> Result<()> {
        if amount.is_zero() {
            return Err(LoanError::ZeroPayment);
        }
        Ok(())
    }
}
