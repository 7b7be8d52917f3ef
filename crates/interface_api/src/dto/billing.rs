//! Invoice and payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{Currency, CustomerId, InvoiceId, Money, OrderId, UserId};
use domain_billing::{
    Allocation, CreateInvoice, CreatePayment, Payment, PaymentApplication, PaymentMethod,
};
use domain_sales::LineInput;

/// Either `lines` or `order_id` must be present; with both, `lines` wins
/// and the order is only referenced
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub customer_id: CustomerId,
    pub order_id: Option<OrderId>,
    pub lines: Option<Vec<LineInput>>,
    pub tax_total: Option<Decimal>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub currency: Option<Currency>,
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
    #[validate(length(max = 4000))]
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

impl From<CreateInvoiceRequest> for CreateInvoice {
    fn from(request: CreateInvoiceRequest) -> Self {
        CreateInvoice {
            customer_id: request.customer_id,
            order_id: request.order_id,
            lines: request.lines,
            tax_total_override: request.tax_total,
            invoice_date: request.invoice_date,
            due_date: request.due_date,
            currency: request.currency,
            external_ref: request.external_ref,
            notes: request.notes,
            owner: request.owner,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplaceInvoiceLinesRequest {
    pub lines: Vec<LineInput>,
    /// Replaces the computed tax total when present
    pub tax_total: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct TaxOverrideRequest {
    pub tax_total: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub customer_id: CustomerId,
    pub amount: Decimal,
    pub currency: Option<Currency>,
    pub invoice_id: Option<InvoiceId>,
    pub method: Option<PaymentMethod>,
    pub received_date: Option<DateTime<Utc>>,
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
    #[validate(length(max = 4000))]
    pub note: Option<String>,
    pub owner: Option<UserId>,
}

impl From<CreatePaymentRequest> for CreatePayment {
    fn from(request: CreatePaymentRequest) -> Self {
        CreatePayment {
            currency: request.currency,
            invoice_id: request.invoice_id,
            method: request.method,
            received_date: request.received_date,
            external_ref: request.external_ref,
            note: request.note,
            owner: request.owner,
            ..CreatePayment::new(request.customer_id, request.amount)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApplyPaymentRequest {
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
}

/// A payment with its unallocated balance
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub remaining: Money,
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub application: PaymentApplication,
    pub payment: Payment,
    pub remaining: Money,
}

impl From<Allocation> for AllocationResponse {
    fn from(allocation: Allocation) -> Self {
        Self {
            application: allocation.application,
            payment: allocation.payment,
            remaining: allocation.remaining,
        }
    }
}
