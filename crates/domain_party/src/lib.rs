//! Customer Management Domain
//!
//! Customers are the billing counterparties of the order-to-cash engine:
//! every order, invoice and payment belongs to exactly one customer. This
//! crate owns the customer aggregate, its persistence port and the
//! maintenance service (create, update, soft delete, restore, hard delete).
//!
//! Other domains only ever *look up* customers through [`CustomerPort`];
//! they never mutate them.

pub mod customer;
pub mod error;
pub mod ports;
pub mod service;

pub use customer::{Customer, CustomerUpdate, NewCustomer};
pub use error::PartyError;
pub use ports::CustomerPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockCustomerPort;
pub use service::CustomerService;
