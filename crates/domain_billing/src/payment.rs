//! Payment types
//!
//! A payment records money received from a customer. It is spent by
//! allocating portions of it to invoices (see [`crate::allocation`]); each
//! allocation is a [`PaymentApplication`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    Actor, AuditEnvelope, Auditable, Currency, CustomerId, Deletion, InvoiceId, Money,
    PaymentApplicationId, PaymentId, SoftDeletable, UserId,
};

use crate::error::BillingError;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Received, with balance left to allocate
    #[default]
    Received,
    /// Fully allocated
    Applied,
    /// Payment failed
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Received => "received",
            PaymentStatus::Applied => "applied",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(PaymentStatus::Received),
            "applied" => Ok(PaymentStatus::Applied),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(BillingError::validation(format!("unknown payment status: {other}"))),
        }
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Card,
    Check,
    Cash,
    DirectDebit,
    DigitalWallet,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Check => "check",
            PaymentMethod::Cash => "cash",
            PaymentMethod::DirectDebit => "direct_debit",
            PaymentMethod::DigitalWallet => "digital_wallet",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "card" => Ok(PaymentMethod::Card),
            "check" => Ok(PaymentMethod::Check),
            "cash" => Ok(PaymentMethod::Cash),
            "direct_debit" => Ok(PaymentMethod::DirectDebit),
            "digital_wallet" => Ok(PaymentMethod::DigitalWallet),
            "other" => Ok(PaymentMethod::Other),
            other => Err(BillingError::validation(format!("unknown payment method: {other}"))),
        }
    }
}

/// Fields supplied when recording a payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub invoice_id: Option<InvoiceId>,
    pub method: Option<PaymentMethod>,
    pub received_date: Option<DateTime<Utc>>,
    pub external_ref: Option<String>,
    pub note: Option<String>,
    pub owner: Option<UserId>,
}

/// A payment received from a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub customer_id: CustomerId,
    /// Informational only; allocation targets are chosen per application
    pub invoice_id: Option<InvoiceId>,
    pub amount: Money,
    pub method: Option<PaymentMethod>,
    pub received_date: DateTime<Utc>,
    pub external_ref: Option<String>,
    pub note: Option<String>,
    pub status: PaymentStatus,
    pub audit: AuditEnvelope,
    pub deletion: Deletion,
}

impl Payment {
    /// Records a payment; the amount must be positive and fit the currency
    pub fn new(
        actor: &Actor,
        customer_id: CustomerId,
        amount: Decimal,
        currency: Currency,
        details: PaymentDetails,
    ) -> Result<Self, BillingError> {
        if amount <= Decimal::ZERO {
            return Err(BillingError::validation("amount must be greater than zero"));
        }
        if amount.normalize().scale() > currency.decimal_places() {
            return Err(BillingError::validation(format!(
                "amount supports at most {} decimal places in {}",
                currency.decimal_places(),
                currency
            )));
        }

        Ok(Self {
            id: PaymentId::new_v7(),
            customer_id,
            invoice_id: details.invoice_id,
            amount: Money::rounded(amount, currency),
            method: details.method,
            received_date: details.received_date.unwrap_or_else(Utc::now),
            external_ref: details.external_ref,
            note: details.note,
            status: PaymentStatus::Received,
            audit: AuditEnvelope::new(actor, details.owner),
            deletion: Deletion::default(),
        })
    }

    pub fn currency(&self) -> Currency {
        self.amount.currency()
    }

    /// Amount still available given what has already been applied
    pub fn remaining(&self, applied_total: Decimal) -> Money {
        Money::rounded(self.amount.amount() - applied_total, self.currency())
    }
}

impl Auditable for Payment {
    fn audit(&self) -> &AuditEnvelope {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditEnvelope {
        &mut self.audit
    }
}

impl SoftDeletable for Payment {
    const ENTITY: &'static str = "payment";

    fn deletion(&self) -> &Deletion {
        &self.deletion
    }

    fn deletion_mut(&mut self) -> &mut Deletion {
        &mut self.deletion
    }
}

/// A portion of a payment allocated to one invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub id: PaymentApplicationId,
    pub payment_id: PaymentId,
    pub invoice_id: InvoiceId,
    pub amount_applied: Money,
    pub created_at: DateTime<Utc>,
}

impl PaymentApplication {
    pub fn new(payment_id: PaymentId, invoice_id: InvoiceId, amount_applied: Money) -> Self {
        Self {
            id: PaymentApplicationId::new_v7(),
            payment_id,
            invoice_id,
            amount_applied,
            created_at: Utc::now(),
        }
    }
}
