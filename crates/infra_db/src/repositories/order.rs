//! Order repository
//!
//! An order is written as one transaction: the header is upserted, every
//! existing line is removed and the new line set inserted in position order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use core_kernel::ListQuery;

use super::{audit_placeholders, bind_audit, page_params, AuditColumns, AUDIT_COLUMNS, AUDIT_UPDATE};
use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub external_ref: Option<String>,
    pub order_date: DateTime<Utc>,
    pub status: String,
    pub currency: String,
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderLineRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, customer_id, external_ref, order_date, status, currency, notes, \
     subtotal, tax_total, total";

const LINE_COLUMNS: &str = "id, order_id, position, product_id, quantity, unit_price, tax_rate, \
     line_total, created_at";

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<(OrderRow, Vec<OrderLineRow>), DatabaseError> {
        let header = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {COLUMNS}, {AUDIT_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Order", id))?;

        let lines = self.lines_for(&[id]).await?;
        Ok((header, lines))
    }

    pub async fn list(
        &self,
        customer_id: Option<Uuid>,
        query: &ListQuery,
    ) -> Result<Vec<(OrderRow, Vec<OrderLineRow>)>, DatabaseError> {
        let (include_deleted, limit, offset) = page_params(query);
        let headers = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {COLUMNS}, {AUDIT_COLUMNS} FROM orders \
             WHERE ($1::uuid IS NULL OR customer_id = $1) AND ($2 OR NOT is_deleted) \
             ORDER BY created_at, id LIMIT $3 OFFSET $4"
        ))
        .bind(customer_id)
        .bind(include_deleted)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let mut by_order: HashMap<Uuid, Vec<OrderLineRow>> = HashMap::new();
        for line in self.lines_for(&ids).await? {
            by_order.entry(line.order_id).or_default().push(line);
        }
        Ok(headers
            .into_iter()
            .map(|header| {
                let lines = by_order.remove(&header.id).unwrap_or_default();
                (header, lines)
            })
            .collect())
    }

    /// Upserts the header and replaces every line in one transaction
    pub async fn save(
        &self,
        header: &OrderRow,
        lines: &[OrderLineRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO orders ({COLUMNS}, {AUDIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, {audit}) \
             ON CONFLICT (id) DO UPDATE SET \
                customer_id = EXCLUDED.customer_id, external_ref = EXCLUDED.external_ref, \
                order_date = EXCLUDED.order_date, status = EXCLUDED.status, \
                currency = EXCLUDED.currency, notes = EXCLUDED.notes, \
                subtotal = EXCLUDED.subtotal, tax_total = EXCLUDED.tax_total, \
                total = EXCLUDED.total, {AUDIT_UPDATE}",
            audit = audit_placeholders(11)
        );
        let query = sqlx::query(&sql)
            .bind(header.id)
            .bind(header.customer_id)
            .bind(&header.external_ref)
            .bind(header.order_date)
            .bind(&header.status)
            .bind(&header.currency)
            .bind(&header.notes)
            .bind(header.subtotal)
            .bind(header.tax_total)
            .bind(header.total);
        bind_audit(query, &header.audit).execute(&mut *tx).await?;

        sqlx::query("DELETE FROM order_lines WHERE order_id = $1")
            .bind(header.id)
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO order_lines ({LINE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        for line in lines {
            sqlx::query(&insert)
                .bind(line.id)
                .bind(line.order_id)
                .bind(line.position)
                .bind(line.product_id)
                .bind(line.quantity)
                .bind(line.unit_price)
                .bind(line.tax_rate)
                .bind(line.line_total)
                .bind(line.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes the order; lines cascade
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Order", id));
        }
        Ok(())
    }

    async fn lines_for(&self, order_ids: &[Uuid]) -> Result<Vec<OrderLineRow>, DatabaseError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, OrderLineRow>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines \
             WHERE order_id = ANY($1) ORDER BY order_id, position"
        ))
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
