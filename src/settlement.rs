use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::PartyId;

/// why value moves between parties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferReason {
    /// lender to escrow when a loan is funded
    Funding,
    /// principal to the borrower at issuance
    Disbursement,
    /// borrower to lender
    Repayment,
    /// escrowed principal back to the lender on cancellation
    FundingReturn,
}

/// value movement the loan asks its custody collaborator to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Settlement {
    Transfer {
        from: PartyId,
        to: PartyId,
        amount: Money,
        reason: TransferReason,
    },
    LockCollateral {
        owner: PartyId,
        amount: Money,
    },
    ReleaseCollateral {
        owner: PartyId,
        amount: Money,
    },
    ForfeitCollateral {
        owner: PartyId,
        to: PartyId,
        amount: Money,
    },
}

impl Settlement {
    pub fn amount(&self) -> Money {
        match self {
            Settlement::Transfer { amount, .. }
            | Settlement::LockCollateral { amount, .. }
            | Settlement::ReleaseCollateral { amount, .. }
            | Settlement::ForfeitCollateral { amount, .. } => *amount,
        }
    }
}

/// pending settlement instructions, drained by the caller
#[derive(Debug, Default)]
pub struct SettlementQueue {
    pending: Vec<Settlement>,
}

impl SettlementQueue {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// zero-amount instructions are dropped
    pub fn push(&mut self, settlement: Settlement) {
        if !settlement.amount().is_zero() {
            self.pending.push(settlement);
        }
    }

    pub fn pending(&self) -> &[Settlement] {
        &self.pending
    }

    pub fn take(&mut self) -> Vec<Settlement> {
        std::mem::take(&mut self.pending)
    }
}

/// the party that actually holds and moves value
pub trait Custody {
    fn apply(&mut self, settlement: &Settlement) -> Result<()>;

    /// apply in order, stopping at the first failure
    fn apply_all(&mut self, settlements: &[Settlement]) -> Result<()> {
        for settlement in settlements {
            self.apply(settlement)?;
        }
        Ok(())
    }
}

/// in-memory custody with free and locked balances per party
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    free: HashMap<PartyId, Money>,
    locked: HashMap<PartyId, Money>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&mut self, party: impl Into<PartyId>, amount: Money) {
        *self.free.entry(party.into()).or_default() += amount;
    }

    pub fn balance(&self, party: &PartyId) -> Money {
        self.free.get(party).copied().unwrap_or_default()
    }

    pub fn locked_balance(&self, party: &PartyId) -> Money {
        self.locked.get(party).copied().unwrap_or_default()
    }

    /// free plus locked across every party
    pub fn total(&self) -> Money {
        self.free.values().copied().sum::<Money>() + self.locked.values().copied().sum::<Money>()
    }

    fn ensure(party: &PartyId, available: Money, required: Money) -> Result<()> {
        if available < required {
            return Err(LoanError::InsufficientBalance {
                party: party.clone(),
                available,
                required,
            });
        }
        Ok(())
    }
}

impl Custody for Ledger {
    fn apply(&mut self, settlement: &Settlement) -> Result<()> {
        match settlement {
            Settlement::Transfer { from, to, amount, .. } => {
                Self::ensure(from, self.balance(from), *amount)?;
                *self.free.entry(from.clone()).or_default() -= *amount;
                *self.free.entry(to.clone()).or_default() += *amount;
            }
            Settlement::LockCollateral { owner, amount } => {
                Self::ensure(owner, self.balance(owner), *amount)?;
                *self.free.entry(owner.clone()).or_default() -= *amount;
                *self.locked.entry(owner.clone()).or_default() += *amount;
            }
            Settlement::ReleaseCollateral { owner, amount } => {
                Self::ensure(owner, self.locked_balance(owner), *amount)?;
                *self.locked.entry(owner.clone()).or_default() -= *amount;
                *self.free.entry(owner.clone()).or_default() += *amount;
            }
            Settlement::ForfeitCollateral { owner, to, amount } => {
                Self::ensure(owner, self.locked_balance(owner), *amount)?;
                *self.locked.entry(owner.clone()).or_default() -= *amount;
                *self.free.entry(to.clone()).or_default() += *amount;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(s: &str) -> PartyId {
        PartyId::from(s)
    }

    #[test]
    fn test_transfer_moves_free_balance() {
        let mut ledger = Ledger::new();
        ledger.deposit("lender", Money::new(1_000));

        ledger
            .apply(&Settlement::Transfer {
                from: party("lender"),
                to: party("borrower"),
                amount: Money::new(400),
                reason: TransferReason::Disbursement,
            })
            .unwrap();

        assert_eq!(ledger.balance(&party("lender")), Money::new(600));
        assert_eq!(ledger.balance(&party("borrower")), Money::new(400));
        assert_eq!(ledger.total(), Money::new(1_000));
    }

    #[test]
    fn test_collateral_lock_release_forfeit() {
        let mut ledger = Ledger::new();
        ledger.deposit("borrower", Money::new(500));

        ledger
            .apply(&Settlement::LockCollateral {
                owner: party("borrower"),
                amount: Money::new(300),
            })
            .unwrap();
        assert_eq!(ledger.balance(&party("borrower")), Money::new(200));
        assert_eq!(ledger.locked_balance(&party("borrower")), Money::new(300));

        ledger
            .apply(&Settlement::ReleaseCollateral {
                owner: party("borrower"),
                amount: Money::new(100),
            })
            .unwrap();
        ledger
            .apply(&Settlement::ForfeitCollateral {
                owner: party("borrower"),
                to: party("lender"),
                amount: Money::new(200),
            })
            .unwrap();

        assert_eq!(ledger.balance(&party("borrower")), Money::new(300));
        assert_eq!(ledger.locked_balance(&party("borrower")), Money::ZERO);
        assert_eq!(ledger.balance(&party("lender")), Money::new(200));
    }

    #[test]
    fn test_insufficient_balance_leaves_ledger_untouched() {
        let mut ledger = Ledger::new();
        ledger.deposit("lender", Money::new(10));

        let result = ledger.apply(&Settlement::Transfer {
            from: party("lender"),
            to: party("borrower"),
            amount: Money::new(11),
            reason: TransferReason::Funding,
        });

        assert!(matches!(result, Err(LoanError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance(&party("lender")), Money::new(10));
        assert_eq!(ledger.balance(&party("borrower")), Money::ZERO);
    }

    #[test]
    fn test_queue_drops_zero_amounts() {
        let mut queue = SettlementQueue::new();
        queue.push(Settlement::LockCollateral {
            owner: party("borrower"),
            amount: Money::ZERO,
        });
        queue.push(Settlement::LockCollateral {
            owner: party("borrower"),
            amount: Money::ONE,
        });

        assert_eq!(queue.pending().len(), 1);
        assert_eq!(queue.take().len(), 1);
        assert!(queue.pending().is_empty());
    }
}
