use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::TermLimits;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::PartyId;

/// Recorded loan terms, fields in positional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    pub lender: PartyId,
    pub borrower: PartyId,
    pub principal: Money,
    pub apr: Rate,
    pub collateral_req: Money,
    pub late_fee: Money,
    pub prepayment_penalty: Money,
    /// seconds after issuance during which a prepayment penalty applies
    pub prepayment_period: u64,
    /// seconds after the due date before the late fee applies
    pub grace_period: u64,
    /// seconds after the due date before the loan defaults
    pub time_before_default: u64,
    pub sliding_scale_prepayment_penalty: bool,
    /// seconds from issuance to maturity
    pub term: u64,
}

/// one positional value of [`Terms`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermField {
    Party(PartyId),
    Amount(Money),
    Rate(Rate),
    Seconds(u64),
    Flag(bool),
}

impl fmt::Display for TermField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermField::Party(p) => write!(f, "{}", p),
            TermField::Amount(m) => write!(f, "{}", m),
            TermField::Rate(r) => write!(f, "{}", r.as_scaled()),
            TermField::Seconds(s) => write!(f, "{}", s),
            TermField::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl Terms {
    pub const FIELD_COUNT: usize = 12;

    pub const FIELD_NAMES: [&'static str; Terms::FIELD_COUNT] = [
        "lender",
        "borrower",
        "principal",
        "apr",
        "collateral_req",
        "late_fee",
        "prepayment_penalty",
        "prepayment_period",
        "grace_period",
        "time_before_default",
        "sliding_scale_prepayment_penalty",
        "term",
    ];

    pub fn from_sheet(lender: PartyId, sheet: TermSheet) -> Self {
        Self {
            lender,
            borrower: sheet.borrower,
            principal: sheet.principal,
            apr: sheet.apr,
            collateral_req: sheet.collateral_req,
            late_fee: sheet.late_fee,
            prepayment_penalty: sheet.prepayment_penalty,
            prepayment_period: sheet.prepayment_period,
            grace_period: sheet.grace_period,
            time_before_default: sheet.time_before_default,
            sliding_scale_prepayment_penalty: sheet.sliding_scale_prepayment_penalty,
            term: sheet.term,
        }
    }

    /// values in `FIELD_NAMES` order
    pub fn fields(&self) -> [TermField; Terms::FIELD_COUNT] {
        [
            TermField::Party(self.lender.clone()),
            TermField::Party(self.borrower.clone()),
            TermField::Amount(self.principal),
            TermField::Rate(self.apr),
            TermField::Amount(self.collateral_req),
            TermField::Amount(self.late_fee),
            TermField::Amount(self.prepayment_penalty),
            TermField::Seconds(self.prepayment_period),
            TermField::Seconds(self.grace_period),
            TermField::Seconds(self.time_before_default),
            TermField::Flag(self.sliding_scale_prepayment_penalty),
            TermField::Seconds(self.term),
        ]
    }

    pub fn labeled(&self) -> Vec<(&'static str, TermField)> {
        Terms::FIELD_NAMES.iter().copied().zip(self.fields()).collect()
    }
}

/// Caller-supplied terms; everything in [`Terms`] except the lender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSheet {
    pub borrower: PartyId,
    pub principal: Money,
    pub apr: Rate,
    pub collateral_req: Money,
    pub late_fee: Money,
    pub prepayment_penalty: Money,
    pub prepayment_period: u64,
    pub grace_period: u64,
    pub time_before_default: u64,
    pub term: u64,
    pub sliding_scale_prepayment_penalty: bool,
}

impl TermSheet {
    pub fn builder() -> TermSheetBuilder {
        TermSheetBuilder::new()
    }

    /// check every bound; `lender` is the party recording the terms
    pub fn validate(&self, lender: &PartyId, limits: &TermLimits) -> Result<()> {
        if self.borrower.is_empty() {
            return Err(invalid("borrower is required"));
        }
        if &self.borrower == lender {
            return Err(invalid("borrower and lender must differ"));
        }

        if self.principal.is_zero() {
            return Err(invalid("principal must be greater than zero"));
        }
        if self.term == 0 {
            return Err(invalid("term must be greater than zero"));
        }

        for (name, amount) in [
            ("principal", self.principal),
            ("collateral_req", self.collateral_req),
            ("late_fee", self.late_fee),
            ("prepayment_penalty", self.prepayment_penalty),
        ] {
            if amount > limits.max_principal {
                return Err(invalid(format!(
                    "{} {} exceeds limit {}",
                    name, amount, limits.max_principal
                )));
            }
        }

        if self.apr > limits.max_apr {
            return Err(invalid(format!("apr {} exceeds limit {}", self.apr, limits.max_apr)));
        }

        for (name, secs) in [
            ("prepayment_period", self.prepayment_period),
            ("grace_period", self.grace_period),
            ("time_before_default", self.time_before_default),
            ("term", self.term),
        ] {
            if secs > limits.max_duration_secs {
                return Err(invalid(format!(
                    "{} {}s exceeds limit {}s",
                    name, secs, limits.max_duration_secs
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> LoanError {
    LoanError::InvalidTerms {
        message: message.into(),
    }
}

/// builder for term sheets; fees, penalties and periods default to zero
pub struct TermSheetBuilder {
    borrower: Option<PartyId>,
    principal: Option<Money>,
    apr: Option<Rate>,
    collateral_req: Money,
    late_fee: Money,
    prepayment_penalty: Money,
    prepayment_period: u64,
    grace_period: u64,
    time_before_default: u64,
    term: Option<u64>,
    sliding_scale_prepayment_penalty: bool,
}

impl TermSheetBuilder {
    pub fn new() -> Self {
        Self {
            borrower: None,
            principal: None,
            apr: None,
            collateral_req: Money::ZERO,
            late_fee: Money::ZERO,
            prepayment_penalty: Money::ZERO,
            prepayment_period: 0,
            grace_period: 0,
            time_before_default: 0,
            term: None,
            sliding_scale_prepayment_penalty: false,
        }
    }

    pub fn borrower(mut self, borrower: impl Into<PartyId>) -> Self {
        self.borrower = Some(borrower.into());
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn apr(mut self, apr: Rate) -> Self {
        self.apr = Some(apr);
        self
    }

    pub fn collateral_req(mut self, amount: Money) -> Self {
        self.collateral_req = amount;
        self
    }

    pub fn late_fee(mut self, fee: Money) -> Self {
        self.late_fee = fee;
        self
    }

    pub fn prepayment_penalty(mut self, penalty: Money) -> Self {
        self.prepayment_penalty = penalty;
        self
    }

    pub fn prepayment_period(mut self, secs: u64) -> Self {
        self.prepayment_period = secs;
        self
    }

    pub fn grace_period(mut self, secs: u64) -> Self {
        self.grace_period = secs;
        self
    }

    pub fn time_before_default(mut self, secs: u64) -> Self {
        self.time_before_default = secs;
        self
    }

    pub fn term(mut self, secs: u64) -> Self {
        self.term = Some(secs);
        self
    }

    pub fn sliding_scale_prepayment_penalty(mut self, enabled: bool) -> Self {
        self.sliding_scale_prepayment_penalty = enabled;
        self
    }

    pub fn build(self) -> Result<TermSheet> {
        let borrower = self.borrower.ok_or_else(|| invalid("borrower required"))?;
        let principal = self.principal.ok_or_else(|| invalid("principal required"))?;
        let apr = self.apr.ok_or_else(|| invalid("apr required"))?;
        let term = self.term.ok_or_else(|| invalid("term required"))?;

        Ok(TermSheet {
            borrower,
            principal,
            apr,
            collateral_req: self.collateral_req,
            late_fee: self.late_fee,
            prepayment_penalty: self.prepayment_penalty,
            prepayment_period: self.prepayment_period,
            grace_period: self.grace_period,
            time_before_default: self.time_before_default,
            term,
            sliding_scale_prepayment_penalty: self.sliding_scale_prepayment_penalty,
        })
    }
}

impl Default for TermSheetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> TermSheet {
        TermSheet::builder()
            .borrower("borrower")
            .principal(Money::new(100_000))
            .apr(Rate::from_scaled(5_167_250_000_000_000_000))
            .collateral_req(Money::new(50_000))
            .late_fee(Money::new(100))
            .prepayment_penalty(Money::new(250))
            .prepayment_period(86_400 * 30)
            .grace_period(86_400 * 3)
            .time_before_default(86_400 * 10)
            .term(86_400 * 365)
            .sliding_scale_prepayment_penalty(true)
            .build()
            .unwrap()
    }

    #[test]
    fn test_positional_fields_follow_labels() {
        let terms = Terms::from_sheet(PartyId::from("lender"), sheet());
        let labeled = terms.labeled();

        assert_eq!(labeled.len(), Terms::FIELD_COUNT);
        assert_eq!(labeled[0], ("lender", TermField::Party(PartyId::from("lender"))));
        assert_eq!(labeled[1], ("borrower", TermField::Party(PartyId::from("borrower"))));
        assert_eq!(labeled[2], ("principal", TermField::Amount(Money::new(100_000))));
        assert_eq!(
            labeled[3],
            ("apr", TermField::Rate(Rate::from_scaled(5_167_250_000_000_000_000)))
        );
        assert_eq!(labeled[9], ("time_before_default", TermField::Seconds(86_400 * 10)));
        assert_eq!(labeled[10], ("sliding_scale_prepayment_penalty", TermField::Flag(true)));
        assert_eq!(labeled[11], ("term", TermField::Seconds(86_400 * 365)));
    }

    #[test]
    fn test_valid_sheet_passes() {
        assert!(sheet().validate(&PartyId::from("lender"), &TermLimits::default()).is_ok());
    }

    #[test]
    fn test_zero_principal_and_term_rejected() {
        let lender = PartyId::from("lender");
        let limits = TermLimits::default();

        let mut zero_principal = sheet();
        zero_principal.principal = Money::ZERO;
        assert!(matches!(
            zero_principal.validate(&lender, &limits),
            Err(LoanError::InvalidTerms { .. })
        ));

        let mut zero_term = sheet();
        zero_term.term = 0;
        assert!(matches!(zero_term.validate(&lender, &limits), Err(LoanError::InvalidTerms { .. })));
    }

    #[test]
    fn test_bounds_enforced() {
        let lender = PartyId::from("lender");
        let limits = TermLimits::default();

        let mut huge_fee = sheet();
        huge_fee.late_fee = Money::MAX;
        assert!(huge_fee.validate(&lender, &limits).is_err());

        let mut huge_apr = sheet();
        huge_apr.apr = Rate::from_scaled(u128::MAX);
        assert!(huge_apr.validate(&lender, &limits).is_err());

        let mut long_grace = sheet();
        long_grace.grace_period = u64::MAX;
        assert!(long_grace.validate(&lender, &limits).is_err());

        let mut self_loan = sheet();
        self_loan.borrower = lender.clone();
        assert!(self_loan.validate(&lender, &limits).is_err());
    }

    #[test]
    fn test_builder_requires_core_fields() {
        let missing_term = TermSheet::builder()
            .borrower("b")
            .principal(Money::new(1))
            .apr(Rate::ZERO)
            .build();
        assert!(matches!(missing_term, Err(LoanError::InvalidTerms { .. })));
    }
}
