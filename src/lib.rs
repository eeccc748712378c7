pub mod agreement;
pub mod book;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod payments;
pub mod serialization;
pub mod settlement;
pub mod state;
pub mod terms;
pub mod types;

// re-export key types
pub use agreement::{LoanAgreement, PaymentOutcome};
pub use book::{LoanBook, LoanHandle};
pub use config::{InterestConfig, InterestMethod, LoanConfig, PayerPolicy, PaymentPolicy, TermLimits};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use interest::{
    AccrualEngine, CarriedBalance, CompoundingEngine, CompoundingFrequency, DayCountConvention,
    InterestCalculation, InterestCalculator, PenaltyConfig, PenaltyEngine, INTEREST_CAP,
};
pub use serialization::LoanView;
pub use settlement::{Custody, Ledger, Settlement, TransferReason};
pub use state::{LoanState, StateSnapshot};
pub use terms::{TermField, TermSheet, TermSheetBuilder, Terms};
pub use types::{BalanceBreakdown, LoanId, LoanStatus, PartyId, PaymentApplication};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
