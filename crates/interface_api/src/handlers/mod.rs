//! Request handlers, one module per resource

pub mod customers;
pub mod health;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod products;
