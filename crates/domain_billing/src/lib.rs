//! Billing Domain - Invoices, Payments and Allocation
//!
//! # Invoices
//!
//! An [`Invoice`] bills a customer, optionally for a sales order. Lines are
//! either supplied or copied from the order at creation time, then priced by
//! the same line computer orders use (`domain_sales::pricing`). The tax total
//! may be overridden by the caller. Invoices move `draft → posted` and may be
//! written off; `paid` is never set automatically.
//!
//! # Payments
//!
//! A [`Payment`] is money received from a customer. It is spent through
//! [`PaymentApplication`]s, each allocating part of it to one invoice. The
//! sum of a payment's applications never exceeds its amount:
//!
//! ```rust,ignore
//! use domain_billing::{CreatePayment, PaymentService};
//!
//! let payment = payments.create(&actor, CreatePayment::new(customer_id, dec!(300.00))).await?;
//! payments.apply(&actor, payment.id, first_invoice, dec!(120.00)).await?;  // 180.00 left
//! payments.apply(&actor, payment.id, second_invoice, dec!(180.00)).await?; // status: applied
//! payments.apply(&actor, payment.id, third_invoice, dec!(0.01)).await?;    // Err: exceeds balance
//! ```

pub mod allocation;
pub mod error;
pub mod invoice;
pub mod invoice_service;
pub mod payment;
pub mod payment_service;
pub mod ports;

pub use allocation::{allocate, Allocation};
pub use error::BillingError;
pub use invoice::{
    Invoice, InvoiceDetails, InvoiceDetailsUpdate, InvoiceLine, InvoiceStatus, LineSource,
};
pub use invoice_service::{CreateInvoice, InvoiceService};
pub use payment::{Payment, PaymentApplication, PaymentDetails, PaymentMethod, PaymentStatus};
pub use payment_service::{CreatePayment, PaymentService};
pub use ports::{InvoicePort, PaymentPort};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::InMemoryBillingStore;
