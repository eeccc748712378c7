use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus, PartyId};

/// all events that can be emitted by a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanCreated {
        loan_id: LoanId,
        lender: PartyId,
        timestamp: DateTime<Utc>,
    },
    TermsSet {
        loan_id: LoanId,
        borrower: PartyId,
        principal: Money,
        timestamp: DateTime<Utc>,
    },
    LoanFunded {
        loan_id: LoanId,
        funding_offered: Money,
        principal: Money,
        timestamp: DateTime<Utc>,
    },
    LoanIssued {
        loan_id: LoanId,
        principal: Money,
        maturity_date: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },
    LoanDefaulted {
        loan_id: LoanId,
        outstanding: Money,
        timestamp: DateTime<Utc>,
    },
    LoanCancelled {
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentReceived {
        loan_id: LoanId,
        payer: PartyId,
        amount: Money,
        applied_to_fees: Money,
        applied_to_interest: Money,
        applied_to_principal: Money,
        timestamp: DateTime<Utc>,
    },
    OverpaymentReturned {
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // fee events
    LateFeeApplied {
        loan_id: LoanId,
        fee_amount: Money,
        timestamp: DateTime<Utc>,
    },
    PrepaymentPenaltyApplied {
        loan_id: LoanId,
        penalty_amount: Money,
        timestamp: DateTime<Utc>,
    },

    // collateral events
    CollateralPledged {
        loan_id: LoanId,
        amount: Money,
        total_pledged: Money,
        timestamp: DateTime<Utc>,
    },
    CollateralLocked {
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    CollateralReleased {
        loan_id: LoanId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    CollateralForfeited {
        loan_id: LoanId,
        amount: Money,
        to: PartyId,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// append every event of `other`, draining it
    pub fn absorb(&mut self, other: &mut EventStore) {
        self.events.append(&mut other.events);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_drains_store() {
        let mut store = EventStore::new();
        store.emit(Event::LoanCancelled {
            loan_id: Uuid::nil(),
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 1);
        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_absorb_preserves_order() {
        let now = Utc::now();
        let mut staged = EventStore::new();
        staged.emit(Event::LateFeeApplied {
            loan_id: Uuid::nil(),
            fee_amount: Money::new(5),
            timestamp: now,
        });
        staged.emit(Event::LoanCancelled {
            loan_id: Uuid::nil(),
            timestamp: now,
        });

        let mut store = EventStore::new();
        store.absorb(&mut staged);
        assert!(staged.events().is_empty());
        assert!(matches!(store.events()[0], Event::LateFeeApplied { .. }));
        assert!(matches!(store.events()[1], Event::LoanCancelled { .. }));
    }
}
