//! Billing repository
//!
//! Invoices (with lines), payments and payment applications. Two operations
//! span several tables and run in a single transaction:
//!
//! - [`BillingRepository::delete_invoice`] removes applications, lines and
//!   the invoice together.
//! - [`BillingRepository::commit_allocation`] locks the payment row
//!   (`SELECT ... FOR UPDATE`), rejects a soft-deleted payment, re-reads the
//!   applied total and only then inserts the application and writes a
//!   changed payment status with its modifier stamp. Deletion columns are
//!   left alone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use core_kernel::ListQuery;

use super::{audit_placeholders, bind_audit, page_params, AuditColumns, AUDIT_COLUMNS, AUDIT_UPDATE};
use crate::error::DatabaseError;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub external_ref: Option<String>,
    pub invoice_date: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
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
pub struct InvoiceLineRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub position: i32,
    pub product_id: Option<Uuid>,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub external_ref: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub method: Option<String>,
    pub received_date: DateTime<Utc>,
    pub note: Option<String>,
    pub status: String,
    #[sqlx(flatten)]
    pub audit: AuditColumns,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PaymentApplicationRow {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub invoice_id: Uuid,
    pub amount_applied: Decimal,
    pub created_at: DateTime<Utc>,
}

const INVOICE_COLUMNS: &str = "id, customer_id, order_id, external_ref, invoice_date, due_date, \
     status, currency, notes, subtotal, tax_total, total";

const INVOICE_LINE_COLUMNS: &str = "id, invoice_id, position, product_id, description, quantity, \
     unit_price, tax_rate, line_total, created_at";

const PAYMENT_COLUMNS: &str = "id, customer_id, invoice_id, external_ref, amount, currency, \
     method, received_date, note, status";

const APPLICATION_COLUMNS: &str = "id, payment_id, invoice_id, amount_applied, created_at";

const APPLIED_TO_PAYMENT: &str =
    "SELECT COALESCE(SUM(amount_applied), 0) FROM payment_applications WHERE payment_id = $1";

/// Outcome of [`BillingRepository::commit_allocation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationCommit {
    Committed,
    /// The applied total in the store no longer matched the caller's
    Stale { current: Decimal },
    PaymentMissing,
    /// The payment was soft-deleted after the caller loaded it
    PaymentDeleted,
}

#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    pub async fn get_invoice(
        &self,
        id: Uuid,
    ) -> Result<(InvoiceRow, Vec<InvoiceLineRow>), DatabaseError> {
        let header = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS}, {AUDIT_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

        let lines = self.invoice_lines_for(&[id]).await?;
        Ok((header, lines))
    }

    pub async fn list_invoices(
        &self,
        customer_id: Option<Uuid>,
        query: &ListQuery,
    ) -> Result<Vec<(InvoiceRow, Vec<InvoiceLineRow>)>, DatabaseError> {
        let (include_deleted, limit, offset) = page_params(query);
        let headers = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS}, {AUDIT_COLUMNS} FROM invoices \
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
        let mut by_invoice: HashMap<Uuid, Vec<InvoiceLineRow>> = HashMap::new();
        for line in self.invoice_lines_for(&ids).await? {
            by_invoice.entry(line.invoice_id).or_default().push(line);
        }
        Ok(headers
            .into_iter()
            .map(|header| {
                let lines = by_invoice.remove(&header.id).unwrap_or_default();
                (header, lines)
            })
            .collect())
    }

    /// Upserts the header and replaces every line in one transaction
    pub async fn save_invoice(
        &self,
        header: &InvoiceRow,
        lines: &[InvoiceLineRow],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO invoices ({INVOICE_COLUMNS}, {AUDIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, {audit}) \
             ON CONFLICT (id) DO UPDATE SET \
                customer_id = EXCLUDED.customer_id, order_id = EXCLUDED.order_id, \
                external_ref = EXCLUDED.external_ref, invoice_date = EXCLUDED.invoice_date, \
                due_date = EXCLUDED.due_date, status = EXCLUDED.status, \
                currency = EXCLUDED.currency, notes = EXCLUDED.notes, \
                subtotal = EXCLUDED.subtotal, tax_total = EXCLUDED.tax_total, \
                total = EXCLUDED.total, {AUDIT_UPDATE}",
            audit = audit_placeholders(13)
        );
        let query = sqlx::query(&sql)
            .bind(header.id)
            .bind(header.customer_id)
            .bind(header.order_id)
            .bind(&header.external_ref)
            .bind(header.invoice_date)
            .bind(header.due_date)
            .bind(&header.status)
            .bind(&header.currency)
            .bind(&header.notes)
            .bind(header.subtotal)
            .bind(header.tax_total)
            .bind(header.total);
        bind_audit(query, &header.audit).execute(&mut *tx).await?;

        sqlx::query("DELETE FROM invoice_lines WHERE invoice_id = $1")
            .bind(header.id)
            .execute(&mut *tx)
            .await?;

        let insert = format!(
            "INSERT INTO invoice_lines ({INVOICE_LINE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        for line in lines {
            sqlx::query(&insert)
                .bind(line.id)
                .bind(line.invoice_id)
                .bind(line.position)
                .bind(line.product_id)
                .bind(&line.description)
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

    /// Removes applications, lines and the invoice in one transaction
    pub async fn delete_invoice(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM payment_applications WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM invoice_lines WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", id));
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn amount_applied_to_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Decimal, DatabaseError> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_applied), 0) FROM payment_applications \
             WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn invoice_lines_for(
        &self,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<InvoiceLineRow>, DatabaseError> {
        if invoice_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, InvoiceLineRow>(&format!(
            "SELECT {INVOICE_LINE_COLUMNS} FROM invoice_lines \
             WHERE invoice_id = ANY($1) ORDER BY invoice_id, position"
        ))
        .bind(invoice_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    pub async fn get_payment(&self, id: Uuid) -> Result<PaymentRow, DatabaseError> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS}, {AUDIT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Payment", id))
    }

    pub async fn list_payments(
        &self,
        customer_id: Option<Uuid>,
        query: &ListQuery,
    ) -> Result<Vec<PaymentRow>, DatabaseError> {
        let (include_deleted, limit, offset) = page_params(query);
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS}, {AUDIT_COLUMNS} FROM payments \
             WHERE ($1::uuid IS NULL OR customer_id = $1) AND ($2 OR NOT is_deleted) \
             ORDER BY created_at, id LIMIT $3 OFFSET $4"
        ))
        .bind(customer_id)
        .bind(include_deleted)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn save_payment(&self, row: &PaymentRow) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        upsert_payment(&mut tx, row).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Deletes the payment; its applications cascade
    pub async fn delete_payment(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Payment", id));
        }
        Ok(())
    }

    pub async fn applied_total(&self, payment_id: Uuid) -> Result<Decimal, DatabaseError> {
        let total: Decimal = sqlx::query_scalar(APPLIED_TO_PAYMENT)
            .bind(payment_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn applications(
        &self,
        payment_id: Uuid,
    ) -> Result<Vec<PaymentApplicationRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM payment_applications \
             WHERE payment_id = $1 ORDER BY created_at, id"
        ))
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts an application and updates its payment under a row lock
    ///
    /// Nothing is written unless the payment's applied total still equals
    /// `expected_applied_total` once the lock is held.
    pub async fn commit_allocation(
        &self,
        payment: &PaymentRow,
        application: &PaymentApplicationRow,
        expected_applied_total: Decimal,
    ) -> Result<AllocationCommit, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<bool> =
            sqlx::query_scalar("SELECT is_deleted FROM payments WHERE id = $1 FOR UPDATE")
                .bind(payment.id)
                .fetch_optional(&mut *tx)
                .await?;
        match locked {
            None => return Ok(AllocationCommit::PaymentMissing),
            Some(true) => return Ok(AllocationCommit::PaymentDeleted),
            Some(false) => {}
        }

        let current: Decimal = sqlx::query_scalar(APPLIED_TO_PAYMENT)
            .bind(payment.id)
            .fetch_one(&mut *tx)
            .await?;
        if current != expected_applied_total {
            return Ok(AllocationCommit::Stale { current });
        }

        sqlx::query(&format!(
            "INSERT INTO payment_applications ({APPLICATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5)"
        ))
        .bind(application.id)
        .bind(application.payment_id)
        .bind(application.invoice_id)
        .bind(application.amount_applied)
        .bind(application.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE payments SET status = $2, updated_at = $3, last_modified_by = $4, \
             version = version + 1 WHERE id = $1 AND status <> $2",
        )
        .bind(payment.id)
        .bind(&payment.status)
        .bind(payment.audit.updated_at)
        .bind(payment.audit.last_modified_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AllocationCommit::Committed)
    }
}

async fn upsert_payment(
    tx: &mut Transaction<'_, Postgres>,
    row: &PaymentRow,
) -> Result<(), DatabaseError> {
    let sql = format!(
        "INSERT INTO payments ({PAYMENT_COLUMNS}, {AUDIT_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, {audit}) \
         ON CONFLICT (id) DO UPDATE SET \
            customer_id = EXCLUDED.customer_id, invoice_id = EXCLUDED.invoice_id, \
            external_ref = EXCLUDED.external_ref, amount = EXCLUDED.amount, \
            currency = EXCLUDED.currency, method = EXCLUDED.method, \
            received_date = EXCLUDED.received_date, note = EXCLUDED.note, \
            status = EXCLUDED.status, {AUDIT_UPDATE}",
        audit = audit_placeholders(11)
    );
    let query = sqlx::query(&sql)
        .bind(row.id)
        .bind(row.customer_id)
        .bind(row.invoice_id)
        .bind(&row.external_ref)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.method)
        .bind(row.received_date)
        .bind(&row.note)
        .bind(&row.status);
    bind_audit(query, &row.audit).execute(&mut **tx).await?;
    Ok(())
}
