use thiserror::Error;

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus, PartyId};

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid state: current {current:?}, expected {expected}")]
    InvalidState {
        current: LoanStatus,
        expected: String,
    },

    #[error("invalid terms: {message}")]
    InvalidTerms {
        message: String,
    },

    #[error("terms have not been set")]
    TermsNotSet,

    #[error("insufficient funding: required {required}, provided {provided}")]
    InsufficientFunding {
        required: Money,
        provided: Money,
    },

    #[error("payment amount must be greater than zero")]
    ZeroPayment,

    #[error("unauthorized: {caller} is not the {required}")]
    Unauthorized {
        caller: PartyId,
        required: String,
    },

    #[error("insufficient collateral: pledged {pledged}, required {required}")]
    InsufficientCollateral {
        pledged: Money,
        required: Money,
    },

    #[error("invalid collateral: {message}")]
    InvalidCollateral {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("loan lock poisoned")]
    LockPoisoned,

    #[error("insufficient balance for {party}: available {available}, required {required}")]
    InsufficientBalance {
        party: PartyId,
        available: Money,
        required: Money,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoanError {
    pub(crate) fn overflow(context: &str) -> Self {
        LoanError::CalculationError {
            message: format!("arithmetic overflow in {}", context),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;
