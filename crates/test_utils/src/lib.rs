//! Test Utilities Crate
//!
//! Shared test infrastructure for the order-to-cash workspace.
//!
//! # Modules
//!
//! - `fixtures`: fixed actors, amounts, dates and fake customer/product data
//! - `builders`: builders for line items and service requests
//! - `engine`: [`TestEngine`], every service wired to the in-memory ports
//! - `database`: optional Postgres pool for tests that opt in via `ERP_TEST_DATABASE_URL`
//! - `assertions`: assertion helpers for totals, error kinds and audit fields
//! - `generators`: proptest strategies that respect input precision rules

pub mod assertions;
pub mod builders;
pub mod database;
pub mod engine;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use engine::*;
pub use fixtures::*;
pub use generators::*;
