use chrono::{DateTime, Duration, Utc};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{LoanConfig, PayerPolicy};
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::interest::{calculator_for, PenaltyConfig, PenaltyEngine};
use crate::payments::{PaymentContext, PaymentProcessor, PaymentRequest, PaymentWaterfall};
use crate::serialization::LoanView;
use crate::settlement::{Settlement, SettlementQueue, TransferReason};
use crate::state::{LoanState, StateSnapshot};
use crate::terms::{TermSheet, Terms};
use crate::types::{BalanceBreakdown, LoanId, LoanStatus, PartyId, PaymentApplication};

/// result of a single accepted payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub application: PaymentApplication,
    /// prepayment penalty added to fees by this payment
    pub penalty_charged: Money,
    /// late fee materialized by this payment
    pub late_fee_charged: Money,
    pub remaining_balance: Money,
    pub status: LoanStatus,
}

/// balances at one instant, with the late fee not yet recorded
struct Assessment {
    balance: BalanceBreakdown,
    late_fee: Money,
    uncapitalized: Money,
    /// charged if the loan is paid off at this instant
    prepayment_penalty: Money,
}

impl Assessment {
    fn settled(balance: BalanceBreakdown) -> Self {
        Self {
            balance,
            late_fee: Money::ZERO,
            uncapitalized: Money::ZERO,
            prepayment_penalty: Money::ZERO,
        }
    }
}

/// A single loan between one lender and one borrower.
///
/// Every operation reads the clock once and checks all of its preconditions
/// before touching state, so a failing call leaves the loan as it was.
pub struct LoanAgreement {
    id: LoanId,
    lender: PartyId,
    config: LoanConfig,
    terms: Option<Terms>,
    state: LoanState,
    events: EventStore,
    settlements: SettlementQueue,
    snapshots: Vec<StateSnapshot>,
}

impl LoanAgreement {
    /// create a loan owned by `lender` with the standard configuration
    pub fn new(lender: impl Into<PartyId>, time_provider: &SafeTimeProvider) -> Self {
        Self::create(lender.into(), LoanConfig::standard(), time_provider)
    }

    pub fn new_with_config(
        lender: impl Into<PartyId>,
        config: LoanConfig,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::create(lender.into(), config, time_provider))
    }

    fn create(lender: PartyId, config: LoanConfig, time_provider: &SafeTimeProvider) -> Self {
        let id = Uuid::new_v4();
        let now = time_provider.now();

        let mut loan = Self {
            id,
            lender,
            config,
            terms: None,
            state: LoanState::new(id, now),
            events: EventStore::new(),
            settlements: SettlementQueue::new(),
            snapshots: Vec::new(),
        };

        loan.events.emit(Event::LoanCreated {
            loan_id: id,
            lender: loan.lender.clone(),
            timestamp: now,
        });
        loan.snapshot("created", now);

        tracing::info!(loan_id = %id, lender = %loan.lender, "loan created");
        loan
    }

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn lender(&self) -> &PartyId {
        &self.lender
    }

    pub fn config(&self) -> &LoanConfig {
        &self.config
    }

    pub fn state(&self) -> &LoanState {
        &self.state
    }

    pub fn status(&self) -> LoanStatus {
        self.state.status
    }

    /// record the loan terms; only the lender, only once
    pub fn set_terms(
        &mut self,
        caller: &PartyId,
        sheet: TermSheet,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();

        self.require_status(&[LoanStatus::Created], "Created")?;
        self.require_lender(caller)?;
        sheet.validate(&self.lender, &self.config.limits)?;

        let terms = Terms::from_sheet(self.lender.clone(), sheet);
        self.events.emit(Event::TermsSet {
            loan_id: self.id,
            borrower: terms.borrower.clone(),
            principal: terms.principal,
            timestamp: now,
        });

        tracing::info!(
            loan_id = %self.id,
            borrower = %terms.borrower,
            principal = %terms.principal,
            apr = %terms.apr,
            "terms set"
        );

        self.terms = Some(terms);
        self.transition(LoanStatus::TermsSet, "terms set", now);
        self.snapshot("terms set", now);
        Ok(())
    }

    pub fn get_terms(&self) -> Result<&Terms> {
        self.terms.as_ref().ok_or(LoanError::TermsNotSet)
    }

    /// Authorize collateral ahead of funding.
    ///
    /// Pledges accumulate and are locked in full when the loan is funded.
    pub fn pledge_collateral(
        &mut self,
        caller: &PartyId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<Money> {
        let now = time_provider.now();

        self.require_status(&[LoanStatus::TermsSet], "TermsSet")?;
        self.require_borrower(caller)?;
        if amount.is_zero() {
            return Err(LoanError::InvalidCollateral {
                message: "pledge must be greater than zero".to_string(),
            });
        }
        let total = self
            .state
            .collateral_pledged
            .checked_add(amount)
            .ok_or_else(|| LoanError::overflow("collateral pledge"))?;

        self.state.collateral_pledged = total;
        self.events.emit(Event::CollateralPledged {
            loan_id: self.id,
            amount,
            total_pledged: total,
            timestamp: now,
        });

        tracing::info!(loan_id = %self.id, amount = %amount, total = %total, "collateral pledged");
        Ok(total)
    }

    /// Take the lender's funds into escrow and lock the borrower's collateral.
    ///
    /// Funding above the principal is accepted but only the principal is drawn.
    pub fn fund(
        &mut self,
        caller: &PartyId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();

        self.require_status(&[LoanStatus::TermsSet], "TermsSet")?;
        self.require_lender(caller)?;
        let terms = self.get_terms()?.clone();
        self.check_funding(&terms, amount)?;

        self.record_funding(&terms, amount, now);
        self.settlements.push(Settlement::Transfer {
            from: self.lender.clone(),
            to: PartyId::escrow(self.id),
            amount: terms.principal,
            reason: TransferReason::Funding,
        });
        self.state.escrowed_principal = terms.principal;

        self.transition(LoanStatus::Funded, "funded", now);
        self.snapshot("funded", now);
        Ok(())
    }

    /// Disburse escrowed principal to the borrower and start accrual.
    pub fn issue(&mut self, caller: &PartyId, time_provider: &SafeTimeProvider) -> Result<()> {
        let now = time_provider.now();

        self.require_status(&[LoanStatus::Funded], "Funded")?;
        self.require_lender(caller)?;
        let terms = self.get_terms()?.clone();
        let (maturity, _) = schedule_from(&terms, now)?;

        self.settlements.push(Settlement::Transfer {
            from: PartyId::escrow(self.id),
            to: terms.borrower.clone(),
            amount: self.state.escrowed_principal,
            reason: TransferReason::Disbursement,
        });
        self.state.escrowed_principal = Money::ZERO;

        self.activate(&terms, maturity, now);
        Ok(())
    }

    /// Fund and issue in one step; principal goes straight from lender to borrower.
    pub fn fund_and_issue_loan(
        &mut self,
        caller: &PartyId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let now = time_provider.now();

        self.require_status(&[LoanStatus::TermsSet], "TermsSet")?;
        self.require_lender(caller)?;
        let terms = self.get_terms()?.clone();
        self.check_funding(&terms, amount)?;
        let (maturity, _) = schedule_from(&terms, now)?;

        self.record_funding(&terms, amount, now);
        self.settlements.push(Settlement::Transfer {
            from: self.lender.clone(),
            to: terms.borrower.clone(),
            amount: terms.principal,
            reason: TransferReason::Disbursement,
        });

        self.activate(&terms, maturity, now);
        Ok(())
    }

    /// Amount needed to clear the loan at the provider's current time.
    ///
    /// Never changes the loan: calling it twice at the same instant gives the
    /// same answer, and an overdue loan stays `Active` until a payment or
    /// [`enforce_default`](Self::enforce_default) observes it.
    pub fn get_outstanding_balance(&self, time_provider: &SafeTimeProvider) -> Result<Money> {
        Ok(self.balance_breakdown(time_provider)?.total())
    }

    pub fn balance_breakdown(&self, time_provider: &SafeTimeProvider) -> Result<BalanceBreakdown> {
        Ok(self.assess(time_provider.now())?.balance)
    }

    /// Prepayment penalty a payoff at the current time would add.
    ///
    /// A payment covering the outstanding balance is charged this on top, so
    /// `outstanding + pending penalty` is what actually closes the loan.
    pub fn pending_prepayment_penalty(&self, time_provider: &SafeTimeProvider) -> Result<Money> {
        Ok(self.assess(time_provider.now())?.prepayment_penalty)
    }

    /// amount that repays the loan in full at the current time
    pub fn payoff_amount(&self, time_provider: &SafeTimeProvider) -> Result<Money> {
        let assessment = self.assess(time_provider.now())?;
        Ok(assessment.balance.total() + assessment.prepayment_penalty)
    }

    /// Apply a payment through the fees, interest, principal waterfall.
    pub fn make_payment(
        &mut self,
        caller: &PartyId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentOutcome> {
        let now = time_provider.now();

        self.require_status(&[LoanStatus::Active], "Active")?;
        let terms = self.get_terms()?.clone();
        self.require_payer(caller, &terms)?;
        if amount.is_zero() {
            return Err(LoanError::ZeroPayment);
        }

        let (_, deadline) = self.schedule(&terms)?;
        let Assessment {
            mut balance,
            late_fee,
            uncapitalized,
            prepayment_penalty,
        } = self.assess(now)?;

        let penalty = if amount >= balance.total() {
            prepayment_penalty
        } else {
            Money::ZERO
        };
        balance.fees = balance
            .fees
            .checked_add(penalty)
            .ok_or_else(|| LoanError::overflow("prepayment penalty"))?;

        let mut staged = EventStore::new();
        if !late_fee.is_zero() {
            staged.emit(Event::LateFeeApplied {
                loan_id: self.id,
                fee_amount: late_fee,
                timestamp: now,
            });
        }
        if !penalty.is_zero() {
            staged.emit(Event::PrepaymentPenaltyApplied {
                loan_id: self.id,
                penalty_amount: penalty,
                timestamp: now,
            });
        }

        let mut context = PaymentContext::from_balance(self.id, balance);
        let request = PaymentRequest {
            loan_id: self.id,
            payer: caller.clone(),
            amount,
            payment_date: now,
        };
        let result = PaymentProcessor::new(PaymentWaterfall::standard())
            .process(&request, &mut context, &mut staged)?;

        // preconditions hold from here on
        if !late_fee.is_zero() {
            self.state.late_fee_charged = true;
            tracing::warn!(loan_id = %self.id, fee = %late_fee, "late fee applied");
        }
        if !penalty.is_zero() {
            self.state.prepayment_penalty_charged = true;
        }
        self.state.total_fees_charged += late_fee + penalty;
        self.state.set_balance(context.balance(), uncapitalized);
        self.state.record_payment(&result.application, now);

        if !result.application.excess.is_zero() {
            staged.emit(Event::OverpaymentReturned {
                loan_id: self.id,
                amount: result.application.excess,
                timestamp: now,
            });
        }
        self.events.absorb(&mut staged);

        self.settlements.push(Settlement::Transfer {
            from: caller.clone(),
            to: self.lender.clone(),
            amount: result.amount_applied,
            reason: TransferReason::Repayment,
        });

        tracing::info!(
            loan_id = %self.id,
            payer = %caller,
            applied = %result.amount_applied,
            remaining = %result.remaining_balance,
            "payment applied"
        );

        if context.balance().is_cleared() {
            self.close_repaid(&terms, result.amount_applied, now);
        } else if now > deadline {
            self.mark_defaulted(&terms, now);
        }

        self.snapshot(&format!("payment: {}", amount), now);

        Ok(PaymentOutcome {
            application: result.application,
            penalty_charged: penalty,
            late_fee_charged: late_fee,
            remaining_balance: self.state.recorded_balance().total(),
            status: self.state.status,
        })
    }

    /// Default an active loan whose deadline has passed.
    ///
    /// Returns `false` when the loan is active but not yet overdue.
    pub fn enforce_default(&mut self, time_provider: &SafeTimeProvider) -> Result<bool> {
        let now = time_provider.now();

        self.require_status(&[LoanStatus::Active], "Active")?;
        let terms = self.get_terms()?.clone();
        let (_, deadline) = self.schedule(&terms)?;
        let assessment = self.assess(now)?;

        if now <= deadline || assessment.balance.is_cleared() {
            return Ok(false);
        }

        if !assessment.late_fee.is_zero() {
            self.state.late_fee_charged = true;
            self.state.total_fees_charged += assessment.late_fee;
            self.events.emit(Event::LateFeeApplied {
                loan_id: self.id,
                fee_amount: assessment.late_fee,
                timestamp: now,
            });
        }
        self.state.set_balance(assessment.balance, assessment.uncapitalized);
        self.mark_defaulted(&terms, now);
        self.snapshot("default enforced", now);
        Ok(true)
    }

    /// Close a loan before issuance, returning everything the lender and
    /// borrower put in.
    pub fn cancel(&mut self, caller: &PartyId, time_provider: &SafeTimeProvider) -> Result<()> {
        let now = time_provider.now();

        self.require_status(
            &[LoanStatus::Created, LoanStatus::TermsSet, LoanStatus::Funded],
            "Created, TermsSet or Funded",
        )?;
        self.require_lender(caller)?;

        if !self.state.escrowed_principal.is_zero() {
            self.settlements.push(Settlement::Transfer {
                from: PartyId::escrow(self.id),
                to: self.lender.clone(),
                amount: self.state.escrowed_principal,
                reason: TransferReason::FundingReturn,
            });
            self.state.escrowed_principal = Money::ZERO;
        }

        if let Some(terms) = &self.terms {
            let returned = self.state.collateral_exposure();
            if self.state.status.holds_collateral() && !self.state.collateral_held.is_zero() {
                self.settlements.push(Settlement::ReleaseCollateral {
                    owner: terms.borrower.clone(),
                    amount: self.state.collateral_held,
                });
            }
            if !returned.is_zero() {
                self.events.emit(Event::CollateralReleased {
                    loan_id: self.id,
                    amount: returned,
                    timestamp: now,
                });
            }
        }
        self.state.collateral_pledged = Money::ZERO;
        self.state.collateral_held = Money::ZERO;

        self.events.emit(Event::LoanCancelled {
            loan_id: self.id,
            timestamp: now,
        });
        self.transition(LoanStatus::Cancelled, "cancelled by lender", now);
        self.snapshot("cancelled", now);

        tracing::info!(loan_id = %self.id, "loan cancelled");
        Ok(())
    }

    /// due date: issuance plus term
    pub fn maturity_date(&self) -> Option<DateTime<Utc>> {
        let terms = self.terms.as_ref()?;
        schedule_from(terms, self.state.issuance_time?).ok().map(|(maturity, _)| maturity)
    }

    /// instant after which an unpaid loan defaults
    pub fn default_deadline(&self) -> Option<DateTime<Utc>> {
        let terms = self.terms.as_ref()?;
        schedule_from(terms, self.state.issuance_time?).ok().map(|(_, deadline)| deadline)
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// value movements not yet handed to custody
    pub fn pending_settlements(&self) -> &[Settlement] {
        self.settlements.pending()
    }

    pub fn take_settlements(&mut self) -> Vec<Settlement> {
        self.settlements.take()
    }

    pub fn snapshots(&self) -> &[StateSnapshot] {
        &self.snapshots
    }

    pub fn to_view(&self, time_provider: &SafeTimeProvider) -> Result<LoanView> {
        LoanView::capture(self, time_provider)
    }

    pub fn to_json_pretty(&self, time_provider: &SafeTimeProvider) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_view(time_provider)?)?)
    }

    fn assess(&self, now: DateTime<Utc>) -> Result<Assessment> {
        match self.state.status {
            LoanStatus::Active => {}
            // frozen at default
            LoanStatus::Defaulted => return Ok(Assessment::settled(self.state.recorded_balance())),
            _ => return Ok(Assessment::settled(BalanceBreakdown::default())),
        }

        let terms = self.get_terms()?;
        let issuance = self.issuance_time()?;
        let (maturity, _) = self.schedule(terms)?;
        let since = self.state.last_payment_time.unwrap_or(issuance);

        let carried = calculator_for(&self.config.interest).accrue(
            self.state.carried_balance(),
            terms.apr,
            issuance,
            since,
            now,
        )?;

        let penalties = PenaltyEngine::new(PenaltyConfig::from_terms(terms));
        let late_fee = penalties.late_fee_due(maturity, now, self.state.late_fee_charged);
        let prepayment_penalty = if self.state.prepayment_penalty_charged {
            Money::ZERO
        } else {
            penalties.prepayment_penalty(issuance, now)?
        };

        let balance = BalanceBreakdown {
            principal: carried.principal,
            interest: carried.interest,
            fees: self
                .state
                .accrued_fees
                .checked_add(late_fee)
                .ok_or_else(|| LoanError::overflow("fee accrual"))?,
        };

        tracing::debug!(
            loan_id = %self.id,
            principal = %balance.principal,
            interest = %balance.interest,
            fees = %balance.fees,
            "balance assessed"
        );

        Ok(Assessment {
            balance,
            late_fee,
            uncapitalized: carried.uncapitalized,
            prepayment_penalty,
        })
    }

    fn issuance_time(&self) -> Result<DateTime<Utc>> {
        self.state.issuance_time.ok_or_else(|| LoanError::InvalidState {
            current: self.state.status,
            expected: "issued".to_string(),
        })
    }

    fn schedule(&self, terms: &Terms) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        schedule_from(terms, self.issuance_time()?)
    }

    fn check_funding(&self, terms: &Terms, amount: Money) -> Result<()> {
        if amount < terms.principal {
            return Err(LoanError::InsufficientFunding {
                required: terms.principal,
                provided: amount,
            });
        }
        if self.state.collateral_pledged < terms.collateral_req {
            return Err(LoanError::InsufficientCollateral {
                pledged: self.state.collateral_pledged,
                required: terms.collateral_req,
            });
        }
        Ok(())
    }

    fn record_funding(&mut self, terms: &Terms, amount: Money, now: DateTime<Utc>) {
        self.events.emit(Event::LoanFunded {
            loan_id: self.id,
            funding_offered: amount,
            principal: terms.principal,
            timestamp: now,
        });

        let collateral = self.state.collateral_pledged;
        self.state.collateral_pledged = Money::ZERO;
        self.state.collateral_held = collateral;
        if !collateral.is_zero() {
            self.settlements.push(Settlement::LockCollateral {
                owner: terms.borrower.clone(),
                amount: collateral,
            });
            self.events.emit(Event::CollateralLocked {
                loan_id: self.id,
                amount: collateral,
                timestamp: now,
            });
        }

        tracing::info!(
            loan_id = %self.id,
            offered = %amount,
            principal = %terms.principal,
            collateral = %collateral,
            "loan funded"
        );
    }

    fn activate(&mut self, terms: &Terms, maturity: DateTime<Utc>, now: DateTime<Utc>) {
        self.state.issuance_time = Some(now);
        self.state.last_payment_time = Some(now);
        self.state.principal_outstanding = terms.principal;

        self.events.emit(Event::LoanIssued {
            loan_id: self.id,
            principal: terms.principal,
            maturity_date: maturity,
            timestamp: now,
        });
        self.transition(LoanStatus::Active, "issued", now);
        self.snapshot("issued", now);

        tracing::info!(loan_id = %self.id, principal = %terms.principal, maturity = %maturity, "loan issued");
    }

    fn close_repaid(&mut self, terms: &Terms, final_payment: Money, now: DateTime<Utc>) {
        let collateral = self.state.collateral_held;
        self.state.collateral_held = Money::ZERO;
        if !collateral.is_zero() {
            self.settlements.push(Settlement::ReleaseCollateral {
                owner: terms.borrower.clone(),
                amount: collateral,
            });
            self.events.emit(Event::CollateralReleased {
                loan_id: self.id,
                amount: collateral,
                timestamp: now,
            });
        }

        self.events.emit(Event::LoanRepaid {
            loan_id: self.id,
            final_payment,
            timestamp: now,
        });
        self.transition(LoanStatus::Repaid, "repaid in full", now);

        tracing::info!(loan_id = %self.id, total_paid = %self.state.total_paid, "loan repaid");
    }

    /// freeze the recorded balance and forfeit collateral to the lender
    fn mark_defaulted(&mut self, terms: &Terms, now: DateTime<Utc>) {
        let outstanding = self.state.recorded_balance().total();
        self.state.frozen_balance = Some(outstanding);

        let collateral = self.state.collateral_held;
        self.state.collateral_held = Money::ZERO;
        if !collateral.is_zero() {
            self.settlements.push(Settlement::ForfeitCollateral {
                owner: terms.borrower.clone(),
                to: self.lender.clone(),
                amount: collateral,
            });
            self.events.emit(Event::CollateralForfeited {
                loan_id: self.id,
                amount: collateral,
                to: self.lender.clone(),
                timestamp: now,
            });
        }

        self.events.emit(Event::LoanDefaulted {
            loan_id: self.id,
            outstanding,
            timestamp: now,
        });
        self.transition(LoanStatus::Defaulted, "past default deadline", now);

        tracing::warn!(
            loan_id = %self.id,
            outstanding = %outstanding,
            forfeited = %collateral,
            "loan defaulted"
        );
    }

    fn transition(&mut self, new_status: LoanStatus, reason: &str, now: DateTime<Utc>) {
        let old_status = self.state.status;
        debug_assert!(!old_status.is_terminal(), "transition out of {:?}", old_status);
        self.state.update_status(new_status, now);
        self.events.emit(Event::StatusChanged {
            loan_id: self.id,
            old_status,
            new_status,
            reason: reason.to_string(),
            timestamp: now,
        });
    }

    fn snapshot(&mut self, trigger: &str, now: DateTime<Utc>) {
        self.snapshots
            .push(StateSnapshot::capture(&self.state, trigger.to_string(), now));
    }

    fn require_status(&self, allowed: &[LoanStatus], expected: &str) -> Result<()> {
        if allowed.contains(&self.state.status) {
            return Ok(());
        }
        Err(LoanError::InvalidState {
            current: self.state.status,
            expected: expected.to_string(),
        })
    }

    fn require_lender(&self, caller: &PartyId) -> Result<()> {
        if caller != &self.lender {
            return Err(LoanError::Unauthorized {
                caller: caller.clone(),
                required: "lender".to_string(),
            });
        }
        Ok(())
    }

    fn require_borrower(&self, caller: &PartyId) -> Result<()> {
        if caller != &self.get_terms()?.borrower {
            return Err(LoanError::Unauthorized {
                caller: caller.clone(),
                required: "borrower".to_string(),
            });
        }
        Ok(())
    }

    fn require_payer(&self, caller: &PartyId, terms: &Terms) -> Result<()> {
        let allowed = match self.config.payments.payer {
            PayerPolicy::BorrowerOnly => caller == &terms.borrower,
            PayerPolicy::AnyParty => !caller.is_empty(),
        };
        if !allowed {
            return Err(LoanError::Unauthorized {
                caller: caller.clone(),
                required: match self.config.payments.payer {
                    PayerPolicy::BorrowerOnly => "borrower",
                    PayerPolicy::AnyParty => "identified payer",
                }
                .to_string(),
            });
        }
        Ok(())
    }
}

/// maturity and default deadline for a loan issued at `issuance`
fn schedule_from(terms: &Terms, issuance: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let offset = |secs: u64| {
        i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| LoanError::overflow("loan schedule"))
    };

    let maturity = issuance
        .checked_add_signed(offset(terms.term)?)
        .ok_or_else(|| LoanError::overflow("maturity date"))?;
    let deadline = maturity
        .checked_add_signed(offset(terms.time_before_default)?)
        .ok_or_else(|| LoanError::overflow("default deadline"))?;
    Ok((maturity, deadline))
}
