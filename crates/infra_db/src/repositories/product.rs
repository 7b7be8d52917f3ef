//! Product repository

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::ListQuery;

use super::{audit_placeholders, bind_audit, page_params, AuditColumns, AUDIT_COLUMNS, AUDIT_UPDATE};
use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub external_ref: Option<String>,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub uom: Option<String>,
    pub price: Decimal,
    pub tax_code: Option<String>,
    pub is_active: bool,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

const COLUMNS: &str = "id, external_ref, sku, name, description, uom, price, tax_code, is_active";

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<ProductRow, DatabaseError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS}, {AUDIT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Product", id))
    }

    pub async fn find_by_sku(&self, sku: &str) -> Result<Option<ProductRow>, DatabaseError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS}, {AUDIT_COLUMNS} FROM products WHERE sku = $1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<ProductRow>, DatabaseError> {
        let (include_deleted, limit, offset) = page_params(query);
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {COLUMNS}, {AUDIT_COLUMNS} FROM products \
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

    /// Inserts or updates; a SKU collision surfaces as `DuplicateEntry`
    pub async fn upsert(&self, row: &ProductRow) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO products ({COLUMNS}, {AUDIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, {audit}) \
             ON CONFLICT (id) DO UPDATE SET \
                external_ref = EXCLUDED.external_ref, sku = EXCLUDED.sku, \
                name = EXCLUDED.name, description = EXCLUDED.description, \
                uom = EXCLUDED.uom, price = EXCLUDED.price, \
                tax_code = EXCLUDED.tax_code, is_active = EXCLUDED.is_active, {AUDIT_UPDATE}",
            audit = audit_placeholders(10)
        );
        let query = sqlx::query(&sql)
            .bind(row.id)
            .bind(&row.external_ref)
            .bind(&row.sku)
            .bind(&row.name)
            .bind(&row.description)
            .bind(&row.uom)
            .bind(row.price)
            .bind(&row.tax_code)
            .bind(row.is_active);
        bind_audit(query, &row.audit).execute(&self.pool).await?;
        Ok(())
    }

    /// Fails with `ForeignKeyViolation` while order lines still reference it
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Product", id));
        }
        Ok(())
    }
}
