//! Customer repository

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::ListQuery;

use super::{audit_placeholders, bind_audit, page_params, AuditColumns, AUDIT_COLUMNS, AUDIT_UPDATE};
use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub external_ref: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    pub currency: String,
    pub is_active: bool,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

const COLUMNS: &str = "id, external_ref, name, email, phone, billing_address, shipping_address, \
     currency, is_active";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<CustomerRow, DatabaseError> {
        sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {COLUMNS}, {AUDIT_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Customer", id))
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<CustomerRow>, DatabaseError> {
        let (include_deleted, limit, offset) = page_params(query);
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {COLUMNS}, {AUDIT_COLUMNS} FROM customers \
             WHERE ($1 OR NOT is_deleted) \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        ))
        .bind(include_deleted)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn upsert(&self, row: &CustomerRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO customers ({COLUMNS}, {AUDIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, {audit}) \
             ON CONFLICT (id) DO UPDATE SET \
                external_ref = EXCLUDED.external_ref, name = EXCLUDED.name, \
                email = EXCLUDED.email, phone = EXCLUDED.phone, \
                billing_address = EXCLUDED.billing_address, \
                shipping_address = EXCLUDED.shipping_address, \
                currency = EXCLUDED.currency, is_active = EXCLUDED.is_active, {AUDIT_UPDATE}",
            audit = audit_placeholders(10)
        );
        let query = sqlx::query(&sql)
            .bind(row.id)
            .bind(&row.external_ref)
            .bind(&row.name)
            .bind(&row.email)
            .bind(&row.phone)
            .bind(&row.billing_address)
            .bind(&row.shipping_address)
            .bind(&row.currency)
            .bind(row.is_active);
        bind_audit(query, &row.audit).execute(&self.pool).await?;
        Ok(())
    }

    /// Deletes the customer; orders, invoices and payments cascade
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Customer", id));
        }
        Ok(())
    }
}
