//! Database Test Utilities
//!
//! Postgres-backed tests opt in by setting `ERP_TEST_DATABASE_URL`; without
//! it [`test_database`] returns `None` and the test returns early. The schema
//! is migrated on connect; tests create their own customers rather than
//! truncating, so they can run concurrently.

use std::time::Duration;

use sqlx::PgPool;

use infra_db::{create_pool, run_migrations, DatabaseConfig, DatabaseError};

/// Environment variable naming the test database
pub const TEST_DATABASE_URL_ENV: &str = "ERP_TEST_DATABASE_URL";

/// A migrated pool for integration tests
pub struct TestDatabase {
    pub pool: PgPool,
}

impl TestDatabase {
    /// Connects to `url` and applies the migrations
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let pool = create_pool(
            DatabaseConfig::new(url)
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(30)),
        )
        .await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// A migrated test database, or `None` when `ERP_TEST_DATABASE_URL` is unset
///
/// Each call opens its own pool: `#[tokio::test]` gives every test its own
/// runtime and a pool must not outlive the runtime it was created on.
///
/// # Panics
///
/// Panics if the variable is set but the database cannot be reached or migrated
pub async fn test_database() -> Option<TestDatabase> {
    let url = std::env::var(TEST_DATABASE_URL_ENV).ok()?;
    let db = TestDatabase::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("{TEST_DATABASE_URL_ENV} is set but unusable: {e}"));
    Some(db)
}
