use chrono::{DateTime, Utc};

use crate::decimal::Money;
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::types::{LoanId, PaymentApplication};

use super::{PaymentContext, PaymentRequest};

/// balance component a payment can be applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentComponent {
    Fees,
    Interest,
    Principal,
}

/// payment waterfall configuration
#[derive(Debug, Clone)]
pub struct PaymentWaterfall {
    order: [PaymentComponent; 3],
}

impl PaymentWaterfall {
    /// standard waterfall: fees -> interest -> principal
    pub fn standard() -> Self {
        Self {
            order: [
                PaymentComponent::Fees,
                PaymentComponent::Interest,
                PaymentComponent::Principal,
            ],
        }
    }

    pub fn order(&self) -> &[PaymentComponent] {
        &self.order
    }
}

impl Default for PaymentWaterfall {
    fn default() -> Self {
        Self::standard()
    }
}

/// payment processor
pub struct PaymentProcessor {
    waterfall: PaymentWaterfall,
}

impl PaymentProcessor {
    pub fn new(waterfall: PaymentWaterfall) -> Self {
        Self { waterfall }
    }

    /// process payment through waterfall; anything left over is reported as excess
    pub fn process(
        &self,
        payment: &PaymentRequest,
        context: &mut PaymentContext,
        events: &mut EventStore,
    ) -> Result<PaymentResult> {
        context.validate_payment(payment.amount)?;

        let mut remaining = payment.amount;
        let mut application = PaymentApplication::default();

        for &component in self.waterfall.order() {
            remaining = apply_to_component(component, remaining, context, &mut application);
            if remaining.is_zero() {
                break;
            }
        }
        application.excess = remaining;

        events.emit(Event::PaymentReceived {
            loan_id: payment.loan_id,
            payer: payment.payer.clone(),
            amount: application.total_applied(),
            applied_to_fees: application.to_fees,
            applied_to_interest: application.to_interest,
            applied_to_principal: application.to_principal,
            timestamp: payment.payment_date,
        });

        Ok(PaymentResult {
            loan_id: payment.loan_id,
            amount_applied: application.total_applied(),
            application,
            remaining_balance: context.total_outstanding(),
            payment_date: payment.payment_date,
        })
    }
}

fn apply_to_component(
    component: PaymentComponent,
    available: Money,
    context: &mut PaymentContext,
    application: &mut PaymentApplication,
) -> Money {
    let (balance, applied_field) = match component {
        PaymentComponent::Fees => (&mut context.accrued_fees, &mut application.to_fees),
        PaymentComponent::Interest => (&mut context.accrued_interest, &mut application.to_interest),
        PaymentComponent::Principal => (&mut context.principal_outstanding, &mut application.to_principal),
    };

    let payment = available.min(*balance);
    *balance -= payment;
    *applied_field = payment;

    available - payment
}

/// payment result
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentResult {
    pub loan_id: LoanId,
    pub amount_applied: Money,
    pub application: PaymentApplication,
    pub remaining_balance: Money,
    pub payment_date: DateTime<Utc>,
}
