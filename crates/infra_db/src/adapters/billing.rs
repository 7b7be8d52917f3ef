//! PostgreSQL Billing Store
//!
//! One adapter serves both billing ports so an invoice delete and a payment
//! allocation each run as a single transaction in [`BillingRepository`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use core_kernel::{
    Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, InvoiceLineId,
    ListQuery, OrderId, PaymentApplicationId, PaymentId, PortError, ProductId, TaxRate,
};
use domain_billing::{
    Invoice, InvoiceLine, InvoicePort, InvoiceStatus, Payment, PaymentApplication, PaymentMethod,
    PaymentPort, PaymentStatus,
};

use super::{db_to_port_error, money, ping};
use crate::error::DatabaseError;
use crate::repositories::billing::{
    AllocationCommit, BillingRepository, InvoiceLineRow, InvoiceRow, PaymentApplicationRow,
    PaymentRow,
};
use crate::repositories::{decode, AuditColumns};

/// PostgreSQL-backed implementation of [`InvoicePort`] and [`PaymentPort`]
#[derive(Debug, Clone)]
pub struct PostgresBillingStore {
    repository: BillingRepository,
}

impl PostgresBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillingRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresBillingStore {}

#[async_trait]
impl HealthCheckable for PostgresBillingStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(self.repository.pool(), "postgres-billing-store").await
    }
}

#[async_trait]
impl InvoicePort for PostgresBillingStore {
    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        debug!("fetching invoice");
        let (header, lines) = self
            .repository
            .get_invoice(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Invoice", id, e))?;
        Ok(rows_to_invoice(header, lines)?)
    }

    #[instrument(skip(self))]
    async fn list_invoices(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Invoice>, PortError> {
        let rows = self
            .repository
            .list_invoices(customer_id.map(|c| *c.as_uuid()), &query)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(header, lines)| rows_to_invoice(header, lines))
            .collect::<Result<Vec<_>, _>>()?)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, status = %invoice.status))]
    async fn save_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
        let (header, lines) = invoice_to_rows(invoice);
        self.repository.save_invoice(&header, &lines).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %id))]
    async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError> {
        self.repository
            .delete_invoice(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Invoice", id, e))
    }

    async fn amount_applied_to_invoice(&self, id: InvoiceId) -> Result<Decimal, PortError> {
        Ok(self.repository.amount_applied_to_invoice(*id.as_uuid()).await?)
    }
}

#[async_trait]
impl PaymentPort for PostgresBillingStore {
    #[instrument(skip(self), fields(payment_id = %id))]
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        let row = self
            .repository
            .get_payment(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Payment", id, e))?;
        Ok(row_to_payment(row)?)
    }

    #[instrument(skip(self))]
    async fn list_payments(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Payment>, PortError> {
        let rows = self
            .repository
            .list_payments(customer_id.map(|c| *c.as_uuid()), &query)
            .await?;
        Ok(rows
            .into_iter()
            .map(row_to_payment)
            .collect::<Result<Vec<_>, _>>()?)
    }

    #[instrument(skip(self, payment), fields(payment_id = %payment.id))]
    async fn save_payment(&self, payment: &Payment) -> Result<(), PortError> {
        self.repository.save_payment(&payment_to_row(payment)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(payment_id = %id))]
    async fn delete_payment(&self, id: PaymentId) -> Result<(), PortError> {
        self.repository
            .delete_payment(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Payment", id, e))
    }

    async fn applied_total(&self, payment_id: PaymentId) -> Result<Decimal, PortError> {
        Ok(self.repository.applied_total(*payment_id.as_uuid()).await?)
    }

    async fn applications(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentApplication>, PortError> {
        let currency = self.get_payment(payment_id).await?.currency();
        let rows = self.repository.applications(*payment_id.as_uuid()).await?;
        Ok(rows.into_iter().map(|row| row_to_application(row, currency)).collect())
    }

    #[instrument(
        skip(self, payment, application),
        fields(
            payment_id = %payment.id,
            invoice_id = %application.invoice_id,
            amount = %application.amount_applied
        )
    )]
    async fn commit_allocation(
        &self,
        payment: &Payment,
        application: &PaymentApplication,
        expected_applied_total: Decimal,
    ) -> Result<(), PortError> {
        let outcome = self
            .repository
            .commit_allocation(
                &payment_to_row(payment),
                &application_to_row(application),
                expected_applied_total,
            )
            .await
            .map_err(|e| db_to_port_error("Invoice", application.invoice_id, e))?;

        match outcome {
            AllocationCommit::Committed => Ok(()),
            AllocationCommit::Stale { current } => {
                warn!(%expected_applied_total, %current, "applied total moved before commit");
                Err(PortError::conflict(format!(
                    "payment {} applied total is {current}, expected {expected_applied_total}",
                    payment.id
                )))
            }
            AllocationCommit::PaymentMissing => Err(PortError::not_found("Payment", payment.id)),
            AllocationCommit::PaymentDeleted => {
                warn!("payment soft-deleted before commit");
                Err(PortError::conflict(format!("payment {} was deleted", payment.id)))
            }
        }
    }
}

fn rows_to_invoice(
    header: InvoiceRow,
    lines: Vec<InvoiceLineRow>,
) -> Result<Invoice, DatabaseError> {
    let currency: Currency = decode("invoices.currency", &header.currency)?;
    let status: InvoiceStatus = decode("invoices.status", &header.status)?;
    let (audit, deletion) = header.audit.into_domain();

    Ok(Invoice {
        id: InvoiceId::from(header.id),
        customer_id: CustomerId::from(header.customer_id),
        order_id: header.order_id.map(OrderId::from),
        external_ref: header.external_ref,
        invoice_date: header.invoice_date,
        due_date: header.due_date,
        status,
        currency,
        notes: header.notes,
        lines: lines
            .into_iter()
            .map(|line| InvoiceLine {
                id: InvoiceLineId::from(line.id),
                invoice_id: InvoiceId::from(line.invoice_id),
                product_id: line.product_id.map(ProductId::from),
                description: line.description,
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax_rate: TaxRate::new(line.tax_rate),
                line_total: money(line.line_total, currency),
                created_at: line.created_at,
            })
            .collect(),
        subtotal: money(header.subtotal, currency),
        tax_total: money(header.tax_total, currency),
        total: money(header.total, currency),
        audit,
        deletion,
    })
}

fn invoice_to_rows(invoice: &Invoice) -> (InvoiceRow, Vec<InvoiceLineRow>) {
    let header = InvoiceRow {
        id: *invoice.id.as_uuid(),
        customer_id: *invoice.customer_id.as_uuid(),
        order_id: invoice.order_id.map(Into::into),
        external_ref: invoice.external_ref.clone(),
        invoice_date: invoice.invoice_date,
        due_date: invoice.due_date,
        status: invoice.status.as_str().to_string(),
        currency: invoice.currency.code().to_string(),
        notes: invoice.notes.clone(),
        subtotal: invoice.subtotal.amount(),
        tax_total: invoice.tax_total.amount(),
        total: invoice.total.amount(),
        audit: AuditColumns::from_domain(&invoice.audit, &invoice.deletion),
    };
    let lines = invoice
        .lines
        .iter()
        .enumerate()
        .map(|(position, line)| InvoiceLineRow {
            id: *line.id.as_uuid(),
            invoice_id: *invoice.id.as_uuid(),
            position: position as i32,
            product_id: line.product_id.map(Into::into),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            tax_rate: line.tax_rate.as_decimal(),
            line_total: line.line_total.amount(),
            created_at: line.created_at,
        })
        .collect();
    (header, lines)
}

fn row_to_payment(row: PaymentRow) -> Result<Payment, DatabaseError> {
    let currency: Currency = decode("payments.currency", &row.currency)?;
    let status: PaymentStatus = decode("payments.status", &row.status)?;
    let method = row
        .method
        .as_deref()
        .map(|m| decode::<PaymentMethod>("payments.method", m))
        .transpose()?;
    let (audit, deletion) = row.audit.into_domain();

    Ok(Payment {
        id: PaymentId::from(row.id),
        customer_id: CustomerId::from(row.customer_id),
        invoice_id: row.invoice_id.map(InvoiceId::from),
        amount: money(row.amount, currency),
        method,
        received_date: row.received_date,
        external_ref: row.external_ref,
        note: row.note,
        status,
        audit,
        deletion,
    })
}

fn payment_to_row(payment: &Payment) -> PaymentRow {
    PaymentRow {
        id: *payment.id.as_uuid(),
        customer_id: *payment.customer_id.as_uuid(),
        invoice_id: payment.invoice_id.map(Into::into),
        external_ref: payment.external_ref.clone(),
        amount: payment.amount.amount(),
        currency: payment.currency().code().to_string(),
        method: payment.method.map(|m| m.as_str().to_string()),
        received_date: payment.received_date,
        note: payment.note.clone(),
        status: payment.status.as_str().to_string(),
        audit: AuditColumns::from_domain(&payment.audit, &payment.deletion),
    }
}

fn row_to_application(row: PaymentApplicationRow, currency: Currency) -> PaymentApplication {
    PaymentApplication {
        id: PaymentApplicationId::from(row.id),
        payment_id: PaymentId::from(row.payment_id),
        invoice_id: InvoiceId::from(row.invoice_id),
        amount_applied: money(row.amount_applied, currency),
        created_at: row.created_at,
    }
}

fn application_to_row(application: &PaymentApplication) -> PaymentApplicationRow {
    PaymentApplicationRow {
        id: *application.id.as_uuid(),
        payment_id: *application.payment_id.as_uuid(),
        invoice_id: *application.invoice_id.as_uuid(),
        amount_applied: application.amount_applied.amount(),
        created_at: application.created_at,
    }
}
