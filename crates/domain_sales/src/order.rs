//! Sales order aggregate
//!
//! An order belongs to one customer and holds an ordered list of lines that
//! is always replaced wholesale. Totals are derived from the lines on every
//! replacement and are never edited directly.
//!
//! # Status machine
//!
//! ```text
//! draft ─┬─► confirmed ─┬─► fulfilled ─┬─► closed   (terminal)
//!        └──────────────┴──────────────┘
//! ```
//!
//! Any non-closed order may move to any status, including its current one
//! and backwards; only `closed` is terminal. Soft-deleted orders cannot be
//! transitioned or edited.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    Actor, AuditEnvelope, Auditable, Currency, CustomerId, Deletion, Money, OrderId, OrderLineId,
    ProductId, SoftDeletable, TaxRate, UserId,
};

use crate::error::SalesError;
use crate::pricing::{LineInput, LineTotals, PricedLine, PricedLines};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Draft,
    Confirmed,
    Fulfilled,
    Closed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Closed => "closed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Closed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = SalesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderStatus::Draft),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "closed" => Ok(OrderStatus::Closed),
            other => Err(SalesError::validation(format!("unknown order status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate: TaxRate,
    pub line_total: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    fn from_priced(
        order_id: OrderId,
        index: usize,
        priced: PricedLine,
    ) -> Result<Self, SalesError> {
        let product_id = priced.input.product_id.ok_or_else(|| {
            SalesError::validation(format!("line {}: order lines require a product", index + 1))
        })?;
        Ok(Self {
            id: OrderLineId::new_v7(),
            order_id,
            product_id,
            quantity: priced.input.quantity,
            unit_price: priced.input.unit_price,
            tax_rate: priced.input.tax_rate,
            line_total: priced.line_total,
            created_at: Utc::now(),
        })
    }

    /// The line as pricing input, e.g. for copying onto an invoice
    pub fn to_input(&self) -> LineInput {
        LineInput::new(self.product_id, self.quantity, self.unit_price, self.tax_rate)
    }
}

/// Header fields supplied at creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDetails {
    pub external_ref: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

/// Header edits; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDetailsUpdate {
    pub external_ref: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub external_ref: Option<String>,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub currency: Currency,
    pub notes: Option<String>,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
    pub audit: AuditEnvelope,
    pub deletion: Deletion,
}

fn build_lines(order_id: OrderId, priced: Vec<PricedLine>) -> Result<Vec<OrderLine>, SalesError> {
    priced
        .into_iter()
        .enumerate()
        .map(|(index, line)| OrderLine::from_priced(order_id, index, line))
        .collect()
}

impl Order {
    /// Builds a new order from already priced lines
    pub fn new(
        actor: &Actor,
        customer_id: CustomerId,
        currency: Currency,
        priced: PricedLines,
        details: OrderDetails,
    ) -> Result<Self, SalesError> {
        check_currency(&priced.totals, currency)?;
        let id = OrderId::new_v7();
        let lines = build_lines(id, priced.lines)?;

        Ok(Self {
            id,
            customer_id,
            external_ref: details.external_ref,
            order_date: details.order_date.unwrap_or_else(Utc::now),
            status: details.status.unwrap_or_default(),
            currency,
            notes: details.notes,
            lines,
            subtotal: priced.totals.subtotal,
            tax_total: priced.totals.tax_total,
            total: priced.totals.total,
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

    /// The current lines as pricing input
    pub fn line_inputs(&self) -> Vec<LineInput> {
        self.lines.iter().map(OrderLine::to_input).collect()
    }

    /// Swaps every line for the newly priced set and re-derives totals
    pub fn replace_lines(&mut self, actor: &Actor, priced: PricedLines) -> Result<(), SalesError> {
        self.ensure_not_deleted()?;
        check_currency(&priced.totals, self.currency)?;
        self.lines = build_lines(self.id, priced.lines)?;
        self.subtotal = priced.totals.subtotal;
        self.tax_total = priced.totals.tax_total;
        self.total = priced.totals.total;
        self.stamp_update(actor);
        Ok(())
    }

    pub fn update_details(
        &mut self,
        actor: &Actor,
        update: OrderDetailsUpdate,
    ) -> Result<(), SalesError> {
        self.ensure_not_deleted()?;
        if let Some(external_ref) = update.external_ref {
            self.external_ref = Some(external_ref);
        }
        if let Some(order_date) = update.order_date {
            self.order_date = order_date;
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

    /// Moves the order to `next`
    ///
    /// Repeating the current status succeeds and only restamps the audit fields.
    pub fn transition(&mut self, actor: &Actor, next: OrderStatus) -> Result<(), SalesError> {
        self.ensure_not_deleted()?;
        if self.status.is_terminal() {
            return Err(SalesError::invariant("Order already closed"));
        }
        self.status = next;
        self.stamp_update(actor);
        Ok(())
    }
}

fn check_currency(totals: &LineTotals, currency: Currency) -> Result<(), SalesError> {
    if totals.total.currency() != currency {
        return Err(SalesError::validation(format!(
            "lines priced in {} but order is in {}",
            totals.total.currency(),
            currency
        )));
    }
    Ok(())
}

impl Auditable for Order {
    fn audit(&self) -> &AuditEnvelope {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditEnvelope {
        &mut self.audit
    }
}

impl SoftDeletable for Order {
    const ENTITY: &'static str = "order";

    fn deletion(&self) -> &Deletion {
        &self.deletion
    }

    fn deletion_mut(&mut self) -> &mut Deletion {
        &mut self.deletion
    }
}
