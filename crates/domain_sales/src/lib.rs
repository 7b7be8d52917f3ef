//! Sales Domain
//!
//! Two pieces live here:
//!
//! - [`pricing`]: the monetary line computer shared by orders and invoices.
//!   It validates line items, resolves product references and derives
//!   subtotal, tax and total in exact decimal arithmetic.
//! - [`order`] / [`service`]: the sales order aggregate and its lifecycle
//!   (create, replace lines, transition, soft delete, restore, hard delete).

pub mod error;
pub mod order;
pub mod ports;
pub mod pricing;
pub mod service;

pub use error::SalesError;
pub use order::{Order, OrderDetails, OrderDetailsUpdate, OrderLine, OrderStatus};
pub use ports::OrderPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockOrderPort;
pub use pricing::{
    compute, price_lines, resolve_products, LineInput, LineTotals, PricedLine, PricedLines,
};
pub use service::{resolve_customer, CreateOrder, OrderService};
