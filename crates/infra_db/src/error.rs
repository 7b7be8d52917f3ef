//! Database error types
//!
//! SQLx failures are classified by PostgreSQL error code so adapters can
//! report constraint collisions as conflicts rather than opaque failures.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored value cannot be turned back into a domain value
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A row lock was not granted within the session's `lock_timeout`
    #[error("Lock not available: {0}")]
    LockTimeout(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Any other SQL error
    #[error("SQL error: {0}")]
    Sql(#[source] sqlx::Error),
}

impl DatabaseError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }

    pub fn corrupt(column: &str, detail: impl std::fmt::Display) -> Self {
        DatabaseError::CorruptRow(format!("{column}: {detail}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted)
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            // https://www.postgresql.org/docs/current/errcodes-appendix.html
            let code = db_err.code().map(|c| c.into_owned());
            let message = db_err.message().to_string();
            match code.as_deref() {
                Some("23505") => return DatabaseError::DuplicateEntry(message),
                Some("23503") => return DatabaseError::ForeignKeyViolation(message),
                Some("23514") | Some("22003") => return DatabaseError::ConstraintViolation(message),
                Some("55P03") => return DatabaseError::LockTimeout(message),
                _ => {}
            }
        }

        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(e) => DatabaseError::ConnectionFailed(e.to_string()),
            other => DatabaseError::Sql(other),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound(message) => PortError::NotFound {
                entity_type: "record".to_string(),
                id: message,
            },
            DatabaseError::DuplicateEntry(message)
            | DatabaseError::ForeignKeyViolation(message)
            | DatabaseError::LockTimeout(message) => PortError::conflict(message),
            DatabaseError::ConstraintViolation(message) => PortError::validation(message),
            e @ (DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted) => {
                PortError::Connection {
                    message: e.to_string(),
                    source: Some(Box::new(e)),
                }
            }
            e => PortError::Internal {
                message: e.to_string(),
                source: Some(Box::new(e)),
            },
        }
    }
}
