use hourglass_rs::SafeTimeProvider;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::agreement::LoanAgreement;
use crate::config::LoanConfig;
use crate::errors::{LoanError, Result};
use crate::types::{LoanId, PartyId};

/// shared handle to one loan
pub type LoanHandle = Arc<Mutex<LoanAgreement>>;

/// Many independent loans keyed by id.
///
/// Calls on the same loan are serialized by that loan's mutex; different
/// loans never contend beyond the brief map lookup.
#[derive(Default)]
pub struct LoanBook {
    loans: RwLock<HashMap<LoanId, LoanHandle>>,
}

impl LoanBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// open a loan with the standard configuration
    pub fn open(&self, lender: impl Into<PartyId>, time_provider: &SafeTimeProvider) -> Result<LoanId> {
        self.insert(LoanAgreement::new(lender, time_provider))
    }

    pub fn open_with_config(
        &self,
        lender: impl Into<PartyId>,
        config: LoanConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanId> {
        self.insert(LoanAgreement::new_with_config(lender, config, time_provider)?)
    }

    fn insert(&self, loan: LoanAgreement) -> Result<LoanId> {
        let id = loan.id();
        self.loans
            .write()
            .map_err(|_| LoanError::LockPoisoned)?
            .insert(id, Arc::new(Mutex::new(loan)));

        tracing::debug!(loan_id = %id, "loan added to book");
        Ok(id)
    }

    pub fn get(&self, id: LoanId) -> Result<LoanHandle> {
        self.loans
            .read()
            .map_err(|_| LoanError::LockPoisoned)?
            .get(&id)
            .cloned()
            .ok_or(LoanError::LoanNotFound { id })
    }

    /// run `f` with exclusive access to one loan
    pub fn with_loan<T>(
        &self,
        id: LoanId,
        f: impl FnOnce(&mut LoanAgreement) -> Result<T>,
    ) -> Result<T> {
        let handle = self.get(id)?;
        let mut loan = handle.lock().map_err(|_| LoanError::LockPoisoned)?;
        f(&mut loan)
    }

    pub fn remove(&self, id: LoanId) -> Result<LoanHandle> {
        self.loans
            .write()
            .map_err(|_| LoanError::LockPoisoned)?
            .remove(&id)
            .ok_or(LoanError::LoanNotFound { id })
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.loans.read().map_err(|_| LoanError::LockPoisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn ids(&self) -> Result<Vec<LoanId>> {
        Ok(self
            .loans
            .read()
            .map_err(|_| LoanError::LockPoisoned)?
            .keys()
            .copied()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::terms::TermSheet;
    use crate::types::LoanStatus;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use std::thread;
    use uuid::Uuid;

    fn clock() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ))
    }

    fn issue(book: &LoanBook, id: LoanId, time: &SafeTimeProvider) {
        book.with_loan(id, |loan| {
            let lender = loan.lender().clone();
            let sheet = TermSheet::builder()
                .borrower("borrower")
                .principal(Money::new(10_000))
                .apr(Rate::ZERO)
                .term(86_400)
                .build()?;
            loan.set_terms(&lender, sheet, time)?;
            loan.fund_and_issue_loan(&lender, Money::new(10_000), time)
        })
        .unwrap();
    }

    #[test]
    fn test_open_get_remove() {
        let time = clock();
        let book = LoanBook::new();
        assert!(book.is_empty().unwrap());

        let id = book.open("lender", &time).unwrap();
        assert_eq!(book.len().unwrap(), 1);
        assert_eq!(book.ids().unwrap(), vec![id]);
        assert_eq!(book.get(id).unwrap().lock().unwrap().status(), LoanStatus::Created);

        book.remove(id).unwrap();
        assert!(matches!(book.get(id), Err(LoanError::LoanNotFound { .. })));
        assert!(matches!(
            book.with_loan(Uuid::new_v4(), |loan| Ok(loan.id())),
            Err(LoanError::LoanNotFound { .. })
        ));
    }

    #[test]
    fn test_loans_are_independent() {
        let time = clock();
        let book = LoanBook::new();
        let first = book.open("lender-a", &time).unwrap();
        let second = book.open("lender-b", &time).unwrap();

        issue(&book, first, &time);

        assert_eq!(book.with_loan(first, |loan| Ok(loan.status())).unwrap(), LoanStatus::Active);
        assert_eq!(book.with_loan(second, |loan| Ok(loan.status())).unwrap(), LoanStatus::Created);
    }

    #[test]
    fn test_concurrent_payments_serialize_per_loan() {
        let time = clock();
        let book = Arc::new(LoanBook::new());
        let id = book.open("lender", &time).unwrap();
        issue(&book, id, &time);

        let workers: Vec<_> = (0..10)
            .map(|_| {
                let book = Arc::clone(&book);
                thread::spawn(move || {
                    // each worker reads its own clock pinned to the same instant
                    let time = clock();
                    book.with_loan(id, |loan| {
                        loan.make_payment(&PartyId::from("borrower"), Money::new(1_000), &time)
                    })
                    .unwrap();
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        book.with_loan(id, |loan| {
            assert_eq!(loan.status(), LoanStatus::Repaid);
            assert_eq!(loan.state().payment_count, 10);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_poisoned_book_reports_error() {
        let time = clock();
        let book = Arc::new(LoanBook::new());
        book.open("lender", &time).unwrap();

        let poisoner = Arc::clone(&book);
        let _ = thread::spawn(move || {
            let _guard = poisoner.loans.write().unwrap();
            panic!("poison the book");
        })
        .join();

        assert!(matches!(book.len(), Err(LoanError::LockPoisoned)));
        assert!(matches!(book.is_empty(), Err(LoanError::LockPoisoned)));
        assert!(matches!(book.ids(), Err(LoanError::LockPoisoned)));
    }
}
