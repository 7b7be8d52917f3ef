//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for customers, products, orders, invoices and
//! payments, built on SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] own the SQL and work in plain row structs.
//! - [`adapters`] implement the domain ports on top of the repositories.
//! - [`pool`] builds the connection pool and applies the embedded migrations.
//!
//! Every table carries the same audit and soft-delete columns. Multi-table
//! writes (replacing an order's lines, deleting an invoice, committing a
//! payment allocation) run inside a single transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/erp")).await?;
//! run_migrations(&pool).await?;
//! let billing = PostgresBillingStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{
    PostgresBillingStore, PostgresCustomerAdapter, PostgresOrderAdapter, PostgresProductAdapter,
};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
