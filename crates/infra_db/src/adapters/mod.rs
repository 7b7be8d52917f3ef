//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter owns a
//! repository, converts rows to aggregates and back, and reports failures
//! as `PortError`.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresOrderAdapter;
//! use domain_sales::OrderPort;
//!
//! let orders: Arc<dyn OrderPort> = Arc::new(PostgresOrderAdapter::new(pool));
//! let order = orders.get_order(order_id).await?;
//! ```

use std::time::Instant;

use core_kernel::HealthCheckResult;
use rust_decimal::Decimal;
use sqlx::PgPool;

use core_kernel::{Currency, Money, PortError};

use crate::error::DatabaseError;

pub mod billing;
pub mod catalog;
pub mod party;
pub mod sales;

pub use billing::PostgresBillingStore;
pub use catalog::PostgresProductAdapter;
pub use party::PostgresCustomerAdapter;
pub use sales::PostgresOrderAdapter;

/// Runs `SELECT 1` and reports latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => {
            HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {e}"))
        }
    }
}

/// Maps a repository failure, naming the entity on `NotFound`
pub(crate) fn db_to_port_error(
    entity: &str,
    id: impl std::fmt::Display,
    error: DatabaseError,
) -> PortError {
    if error.is_not_found() {
        PortError::not_found(entity, id)
    } else {
        error.into()
    }
}

pub(crate) fn money(amount: Decimal, currency: Currency) -> Money {
    Money::rounded(amount, currency)
}
