use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// identity of a lender, borrower or payer as resolved by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(id: impl Into<String>) -> Self {
        PartyId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// escrow account holding funded principal for a loan
    pub fn escrow(loan_id: LoanId) -> Self {
        PartyId(format!("escrow:{}", loan_id))
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(s: &str) -> Self {
        PartyId::new(s)
    }
}

impl From<String> for PartyId {
    fn from(s: String) -> Self {
        PartyId(s)
    }
}

/// loan lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// agreement exists, no terms yet
    Created,
    /// terms recorded, awaiting funding
    TermsSet,
    /// lender funds and borrower collateral locked, not yet disbursed
    Funded,
    /// principal disbursed and accruing
    Active,
    /// fully paid off
    Repaid,
    /// unpaid past the default deadline
    Defaulted,
    /// closed before issuance
    Cancelled,
}

impl LoanStatus {
    /// no operation may mutate a loan in a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Repaid | LoanStatus::Defaulted | LoanStatus::Cancelled)
    }

    /// collateral is locked only while funded or active
    pub fn holds_collateral(&self) -> bool {
        matches!(self, LoanStatus::Funded | LoanStatus::Active)
    }
}

/// how a single payment was split across the balance components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentApplication {
    pub to_fees: Money,
    pub to_interest: Money,
    pub to_principal: Money,
    pub excess: Money,
}

impl PaymentApplication {
    pub fn total_applied(&self) -> Money {
        self.to_fees + self.to_interest + self.to_principal
    }
}

/// outstanding balance split by component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BalanceBreakdown {
    pub principal: Money,
    pub interest: Money,
    pub fees: Money,
}

impl BalanceBreakdown {
    pub fn total(&self) -> Money {
        self.principal + self.interest + self.fees
    }

    pub fn is_cleared(&self) -> bool {
        self.total().is_zero()
    }
}
