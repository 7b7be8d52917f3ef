//! Core Kernel - Foundational types shared by every order-to-cash crate
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money and tax-rate types with precise decimal arithmetic
//! - Strongly-typed identifiers for customers, products, orders, invoices and payments
//! - The audit envelope and soft-delete contract carried by every aggregate
//! - Port abstractions and the error taxonomy shared by adapters

pub mod audit;
pub mod error;
pub mod identifiers;
pub mod money;
pub mod ports;

pub use audit::{Actor, AuditEnvelope, Auditable, Deletion, SoftDeletable};
pub use error::{CoreError, ErrorKind};
pub use identifiers::{
    CustomerId, InvoiceId, InvoiceLineId, OrderId, OrderLineId, PaymentApplicationId, PaymentId,
    ProductId, UserId,
};
pub use money::{Currency, Money, MoneyError, TaxRate};
pub use ports::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, ListQuery, PortError,
};
