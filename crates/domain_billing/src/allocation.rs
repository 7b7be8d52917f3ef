//! Payment allocation
//!
//! Applies part of a payment to an invoice without ever letting the sum of
//! a payment's applications exceed its amount. The rule itself is pure:
//! [`allocate`] takes the payment, the target invoice and the payment's
//! current applied total, and returns what should be written. The store
//! then commits the result only if the applied total is still the one the
//! decision was based on.
//!
//! ```text
//! remaining = amount - applied_total
//! amount_applied > remaining          -> rejected
//! remaining - amount_applied <= 0     -> payment becomes `applied`
//! ```
//!
//! Invoice status is never touched here.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Actor, Auditable, Money, SoftDeletable};

use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::payment::{Payment, PaymentApplication, PaymentStatus};

/// Outcome of a successful allocation decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub application: PaymentApplication,
    /// The payment as it should be stored after this allocation
    pub payment: Payment,
    /// Applied total the decision was made against
    pub expected_applied_total: Decimal,
    /// Balance left on the payment once the application is written
    pub remaining: Money,
}

/// Decides an allocation of `amount_applied` from `payment` to `invoice`
pub fn allocate(
    actor: &Actor,
    payment: &Payment,
    invoice: &Invoice,
    applied_total: Decimal,
    amount_applied: Decimal,
) -> Result<Allocation, BillingError> {
    payment.ensure_not_deleted()?;

    let currency = payment.currency();
    if amount_applied <= Decimal::ZERO {
        return Err(BillingError::validation("amount_applied must be greater than zero"));
    }
    if amount_applied.normalize().scale() > currency.decimal_places() {
        return Err(BillingError::validation(format!(
            "amount_applied supports at most {} decimal places in {}",
            currency.decimal_places(),
            currency
        )));
    }
    if invoice.currency != currency {
        return Err(BillingError::validation(format!(
            "invoice is in {} but payment is in {}",
            invoice.currency, currency
        )));
    }

    let remaining = payment.amount.amount() - applied_total;
    if amount_applied > remaining {
        return Err(BillingError::invariant("Amount exceeds remaining balance"));
    }

    let applied = Money::rounded(amount_applied, currency);
    let application = PaymentApplication::new(payment.id, invoice.id, applied);
    let left = remaining - amount_applied;

    let mut updated = payment.clone();
    if left <= Decimal::ZERO {
        updated.status = PaymentStatus::Applied;
        updated.stamp_update(actor);
    }

    Ok(Allocation {
        application,
        payment: updated,
        expected_applied_total: applied_total,
        remaining: Money::rounded(left, currency),
    })
}
