//! Invoice management
//!
//! An invoice bills one customer, optionally for one sales order. Its lines
//! come either from the caller or, when none are supplied, from a
//! point-in-time copy of the order's lines; later order edits never reach
//! an existing invoice.
//!
//! Totals follow the shared line computer, except that a caller may
//! override `tax_total`. The override replaces the computed tax and the
//! total becomes `subtotal + override`.
//!
//! # Status machine
//!
//! ```text
//! draft ──► posted ◄──► written_off
//! ```
//!
//! Only `posted` and `written_off` are reachable through a transition.
//! `paid` exists as a status but is never set automatically, not even when
//! payments fully cover the invoice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    Actor, AuditEnvelope, Auditable, Currency, CustomerId, Deletion, InvoiceId, InvoiceLineId,
    Money, OrderId, ProductId, SoftDeletable, TaxRate, UserId,
};
use domain_sales::{LineInput, LineTotals, Order, PricedLine, PricedLines};

use crate::error::BillingError;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Invoice is being drafted
    #[default]
    Draft,
    /// Invoice has been issued to the customer
    Posted,
    /// Fully paid
    Paid,
    /// Written off as bad debt
    WrittenOff,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Posted => "posted",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::WrittenOff => "written_off",
        }
    }

    /// Whether a transition call may target this status
    pub fn is_transition_target(&self) -> bool {
        matches!(self, InvoiceStatus::Posted | InvoiceStatus::WrittenOff)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "posted" => Ok(InvoiceStatus::Posted),
            "paid" => Ok(InvoiceStatus::Paid),
            "written_off" => Ok(InvoiceStatus::WrittenOff),
            other => Err(BillingError::validation(format!("unknown invoice status: {other}"))),
        }
    }
}

/// Where an invoice's lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    /// Lines supplied with the request (possibly empty)
    Explicit(Vec<LineInput>),
    /// Lines copied from the referenced order
    CopiedFromOrder(Vec<LineInput>),
}

impl LineSource {
    /// Normalizes the request's line source
    ///
    /// Supplied lines always win, even when an order is referenced too.
    /// Without lines the order's current lines are copied. Neither is a
    /// validation error.
    pub fn from_request(
        lines: Option<Vec<LineInput>>,
        order: Option<&Order>,
    ) -> Result<Self, BillingError> {
        match (lines, order) {
            (Some(lines), _) => Ok(LineSource::Explicit(lines)),
            (None, Some(order)) => Ok(LineSource::CopiedFromOrder(order.line_inputs())),
            (None, None) => Err(BillingError::validation("Provide lines or reference an order")),
        }
    }

    pub fn is_copied(&self) -> bool {
        matches!(self, LineSource::CopiedFromOrder(_))
    }

    pub fn into_lines(self) -> Vec<LineInput> {
        match self {
            LineSource::Explicit(lines) | LineSource::CopiedFromOrder(lines) => lines,
        }
    }
}

/// A line item on an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub id: InvoiceLineId,
    pub invoice_id: InvoiceId,
    pub product_id: Option<ProductId>,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate: TaxRate,
    pub line_total: Money,
    pub created_at: DateTime<Utc>,
}

impl InvoiceLine {
    fn from_priced(invoice_id: InvoiceId, priced: PricedLine) -> Self {
        Self {
            id: InvoiceLineId::new_v7(),
            invoice_id,
            product_id: priced.input.product_id,
            description: priced.input.description,
            quantity: priced.input.quantity,
            unit_price: priced.input.unit_price,
            tax_rate: priced.input.tax_rate,
            line_total: priced.line_total,
            created_at: Utc::now(),
        }
    }
}

/// Header fields supplied at creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceDetails {
    pub external_ref: Option<String>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

/// Header edits; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceDetailsUpdate {
    pub external_ref: Option<String>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

/// An invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    /// Originating order, if the invoice was raised for one
    pub order_id: Option<OrderId>,
    pub external_ref: Option<String>,
    pub invoice_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: InvoiceStatus,
    pub currency: Currency,
    pub notes: Option<String>,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
    pub audit: AuditEnvelope,
    pub deletion: Deletion,
}

fn settle_totals(
    priced: &PricedLines,
    tax_override: Option<Decimal>,
) -> Result<LineTotals, BillingError> {
    match tax_override {
        Some(tax) => Ok(priced.totals.with_tax_override(tax)?),
        None => Ok(priced.totals),
    }
}

fn check_currency(totals: &LineTotals, currency: Currency) -> Result<(), BillingError> {
    if totals.total.currency() != currency {
        return Err(BillingError::validation(format!(
            "lines priced in {} but invoice is in {}",
            totals.total.currency(),
            currency
        )));
    }
    Ok(())
}

impl Invoice {
    /// Builds a draft invoice from priced lines
    pub fn new(
        actor: &Actor,
        customer_id: CustomerId,
        order_id: Option<OrderId>,
        currency: Currency,
        priced: PricedLines,
        tax_override: Option<Decimal>,
        details: InvoiceDetails,
    ) -> Result<Self, BillingError> {
        check_currency(&priced.totals, currency)?;
        let totals = settle_totals(&priced, tax_override)?;
        let id = InvoiceId::new_v7();
        let lines = priced
            .lines
            .into_iter()
            .map(|line| InvoiceLine::from_priced(id, line))
            .collect();

        Ok(Self {
            id,
            customer_id,
            order_id,
            external_ref: details.external_ref,
            invoice_date: details.invoice_date.unwrap_or_else(Utc::now),
            due_date: details.due_date,
            status: InvoiceStatus::Draft,
            currency,
            notes: details.notes,
            lines,
            subtotal: totals.subtotal,
            tax_total: totals.tax_total,
            total: totals.total,
            audit: AuditEnvelope::new(actor, details.owner),
            deletion: Deletion::default(),
        })
    }

    pub fn totals(&self) -> LineTotals {
        LineTotals {
            subtotal: self.subtotal,
            tax_total: self.tax_total,
            total: self.total,
        }
    }

    /// Replaces every line; tax is the override when given, else computed
    pub fn replace_lines(
        &mut self,
        actor: &Actor,
        priced: PricedLines,
        tax_override: Option<Decimal>,
    ) -> Result<(), BillingError> {
        self.ensure_not_deleted()?;
        check_currency(&priced.totals, self.currency)?;
        let totals = settle_totals(&priced, tax_override)?;
        let id = self.id;
        self.lines = priced
            .lines
            .into_iter()
            .map(|line| InvoiceLine::from_priced(id, line))
            .collect();
        self.subtotal = totals.subtotal;
        self.tax_total = totals.tax_total;
        self.total = totals.total;
        self.stamp_update(actor);
        Ok(())
    }

    /// Overrides tax on the current lines; total becomes `subtotal + tax`
    pub fn override_tax_total(
        &mut self,
        actor: &Actor,
        tax_total: Decimal,
    ) -> Result<(), BillingError> {
        self.ensure_not_deleted()?;
        let totals = self.totals().with_tax_override(tax_total)?;
        self.tax_total = totals.tax_total;
        self.total = totals.total;
        self.stamp_update(actor);
        Ok(())
    }

    pub fn update_details(
        &mut self,
        actor: &Actor,
        update: InvoiceDetailsUpdate,
    ) -> Result<(), BillingError> {
        self.ensure_not_deleted()?;
        if let Some(external_ref) = update.external_ref {
            self.external_ref = Some(external_ref);
        }
        if let Some(invoice_date) = update.invoice_date {
            self.invoice_date = invoice_date;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        match update.owner {
            Some(owner) if owner != self.audit.owner => self.transfer_ownership(actor, owner),
            _ => self.stamp_update(actor),
        }
        Ok(())
    }

    /// Moves the invoice to `posted` or `written_off`
    ///
    /// Re-posting a posted invoice is allowed.
    pub fn transition(&mut self, actor: &Actor, next: InvoiceStatus) -> Result<(), BillingError> {
        self.ensure_not_deleted()?;
        if !next.is_transition_target() {
            return Err(BillingError::invariant(format!(
                "Invoice cannot be moved to {next}"
            )));
        }
        self.status = next;
        self.stamp_update(actor);
        Ok(())
    }
}

impl Auditable for Invoice {
    fn audit(&self) -> &AuditEnvelope {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditEnvelope {
        &mut self.audit
    }
}

impl SoftDeletable for Invoice {
    const ENTITY: &'static str = "invoice";

    fn deletion(&self) -> &Deletion {
        &self.deletion
    }

    fn deletion_mut(&mut self) -> &mut Deletion {
        &mut self.deletion
    }
}
