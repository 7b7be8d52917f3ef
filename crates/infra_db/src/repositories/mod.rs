//! Repository implementations
//!
//! Repositories own the SQL. They read and write plain row structs
//! (`sqlx::FromRow`) and know nothing about domain rules; the adapters in
//! [`crate::adapters`] translate rows to aggregates and back.
//!
//! Queries are checked at runtime (`sqlx::query_as::<_, Row>`), so the crate
//! builds without a live database.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{FromRow, Postgres};
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{AuditEnvelope, Deletion, ListQuery, UserId};

use crate::error::DatabaseError;

pub mod billing;
pub mod customer;
pub mod order;
pub mod product;

pub use billing::BillingRepository;
pub use customer::CustomerRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;

/// Column list shared by every audited table, in bind order
pub(crate) const AUDIT_COLUMNS: &str = "created_at, updated_at, created_by, last_modified_by, \
     owner_id, version, is_deleted, deleted_at, deleted_by";

/// `SET` clause refreshing the mutable audit columns on upsert
pub(crate) const AUDIT_UPDATE: &str = "updated_at = EXCLUDED.updated_at, \
     last_modified_by = EXCLUDED.last_modified_by, owner_id = EXCLUDED.owner_id, \
     version = EXCLUDED.version, is_deleted = EXCLUDED.is_deleted, \
     deleted_at = EXCLUDED.deleted_at, deleted_by = EXCLUDED.deleted_by";

/// Audit and soft-delete columns
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AuditColumns {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub last_modified_by: Uuid,
    pub owner_id: Uuid,
    pub version: i32,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
}

impl AuditColumns {
    pub fn from_domain(audit: &AuditEnvelope, deletion: &Deletion) -> Self {
        Self {
            created_at: audit.created_at,
            updated_at: audit.updated_at,
            created_by: *audit.created_by.as_uuid(),
            last_modified_by: *audit.last_modified_by.as_uuid(),
            owner_id: *audit.owner.as_uuid(),
            version: audit.version,
            is_deleted: deletion.is_deleted,
            deleted_at: deletion.deleted_at,
            deleted_by: deletion.deleted_by.map(|u| *u.as_uuid()),
        }
    }

    pub fn into_domain(self) -> (AuditEnvelope, Deletion) {
        (
            AuditEnvelope {
                created_at: self.created_at,
                updated_at: self.updated_at,
                created_by: UserId::from(self.created_by),
                last_modified_by: UserId::from(self.last_modified_by),
                owner: UserId::from(self.owner_id),
                version: self.version,
            },
            Deletion {
                is_deleted: self.is_deleted,
                deleted_at: self.deleted_at,
                deleted_by: self.deleted_by.map(UserId::from),
            },
        )
    }
}

/// Binds the audit columns in [`AUDIT_COLUMNS`] order
pub(crate) fn bind_audit<'q>(
    query: Query<'q, Postgres, PgArguments>,
    audit: &AuditColumns,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(audit.created_at)
        .bind(audit.updated_at)
        .bind(audit.created_by)
        .bind(audit.last_modified_by)
        .bind(audit.owner_id)
        .bind(audit.version)
        .bind(audit.is_deleted)
        .bind(audit.deleted_at)
        .bind(audit.deleted_by)
}

/// `$n, $n+1, ...` placeholders for the audit columns starting at `first`
pub(crate) fn audit_placeholders(first: usize) -> String {
    (first..first + 9)
        .map(|n| format!("${n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Limit/offset as bound SQL parameters
pub(crate) fn page_params(query: &ListQuery) -> (bool, i64, i64) {
    (query.include_deleted, i64::from(query.limit), i64::from(query.offset))
}

/// Parses a text column into a domain value
pub fn decode<T>(column: &str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| DatabaseError::corrupt(column, format!("'{value}': {e}")))
}
