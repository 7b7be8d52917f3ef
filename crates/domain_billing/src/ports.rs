//! Billing Domain Ports
//!
//! Invoices and payments share storage concerns: an invoice hard delete must
//! remove the payment applications that reference it, and an allocation
//! writes an application and a payment together. Both traits are usually
//! implemented by the same store.

use async_trait::async_trait;
use rust_decimal::Decimal;

use core_kernel::{CustomerId, DomainPort, InvoiceId, ListQuery, PaymentId, PortError};

use crate::invoice::Invoice;
use crate::payment::{Payment, PaymentApplication};

#[async_trait]
pub trait InvoicePort: DomainPort {
    /// Retrieves an invoice with its lines, or `PortError::NotFound`
    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    async fn list_invoices(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Invoice>, PortError>;

    /// Upserts the invoice header and replaces its lines atomically
    async fn save_invoice(&self, invoice: &Invoice) -> Result<(), PortError>;

    /// Removes the invoice, its lines and every application against it in
    /// one unit of work
    async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError>;

    /// Sum of all amounts applied to the invoice
    async fn amount_applied_to_invoice(&self, id: InvoiceId) -> Result<Decimal, PortError>;
}

#[async_trait]
pub trait PaymentPort: DomainPort {
    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    async fn list_payments(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Payment>, PortError>;

    async fn save_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Removes the payment and its applications
    async fn delete_payment(&self, id: PaymentId) -> Result<(), PortError>;

    /// Sum of `amount_applied` over the payment's applications
    async fn applied_total(&self, payment_id: PaymentId) -> Result<Decimal, PortError>;

    /// The payment's applications, oldest first
    async fn applications(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentApplication>, PortError>;

    /// Writes an application and the updated payment as one unit
    ///
    /// The store must lock the payment, re-read its applied total and fail
    /// with `PortError::Conflict` if it no longer equals
    /// `expected_applied_total` or the stored payment is soft-deleted.
    /// Only a changed status and its modifier stamp are written; deletion
    /// state set by a concurrent soft delete or restore is kept. Nothing is
    /// written on failure.
    async fn commit_allocation(
        &self,
        payment: &Payment,
        application: &PaymentApplication,
        expected_applied_total: Decimal,
    ) -> Result<(), PortError>;
}

/// In-memory billing store for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    struct Tables {
        invoices: HashMap<InvoiceId, Invoice>,
        payments: HashMap<PaymentId, Payment>,
        applications: Vec<PaymentApplication>,
    }

    impl Tables {
        fn applied_total(&self, payment_id: PaymentId) -> Decimal {
            self.applications
                .iter()
                .filter(|a| a.payment_id == payment_id)
                .map(|a| a.amount_applied.amount())
                .sum()
        }
    }

    /// Invoices, payments and applications behind a single lock
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryBillingStore {
        tables: Arc<RwLock<Tables>>,
    }

    impl InMemoryBillingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn application_count(&self) -> usize {
            self.tables.read().await.applications.len()
        }
    }

    impl DomainPort for InMemoryBillingStore {}

    #[async_trait]
    impl InvoicePort for InMemoryBillingStore {
        async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
            self.tables
                .read()
                .await
                .invoices
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Invoice", id))
        }

        async fn list_invoices(
            &self,
            customer_id: Option<CustomerId>,
            query: ListQuery,
        ) -> Result<Vec<Invoice>, PortError> {
            let tables = self.tables.read().await;
            let mut matching: Vec<Invoice> = tables
                .invoices
                .values()
                .filter(|i| customer_id.map_or(true, |c| i.customer_id == c))
                .cloned()
                .collect();
            matching.sort_by_key(|i| (i.audit.created_at, *i.id.as_uuid()));
            Ok(query.page(matching, |i| i.deletion.is_deleted))
        }

        async fn save_invoice(&self, invoice: &Invoice) -> Result<(), PortError> {
            self.tables
                .write()
                .await
                .invoices
                .insert(invoice.id, invoice.clone());
            Ok(())
        }

        async fn delete_invoice(&self, id: InvoiceId) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            if tables.invoices.remove(&id).is_none() {
                return Err(PortError::not_found("Invoice", id));
            }
            tables.applications.retain(|a| a.invoice_id != id);
            Ok(())
        }

        async fn amount_applied_to_invoice(&self, id: InvoiceId) -> Result<Decimal, PortError> {
            Ok(self
                .tables
                .read()
                .await
                .applications
                .iter()
                .filter(|a| a.invoice_id == id)
                .map(|a| a.amount_applied.amount())
                .sum())
        }
    }

    #[async_trait]
    impl PaymentPort for InMemoryBillingStore {
        async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
            self.tables
                .read()
                .await
                .payments
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Payment", id))
        }

        async fn list_payments(
            &self,
            customer_id: Option<CustomerId>,
            query: ListQuery,
        ) -> Result<Vec<Payment>, PortError> {
            let tables = self.tables.read().await;
            let mut matching: Vec<Payment> = tables
                .payments
                .values()
                .filter(|p| customer_id.map_or(true, |c| p.customer_id == c))
                .cloned()
                .collect();
            matching.sort_by_key(|p| (p.audit.created_at, *p.id.as_uuid()));
            Ok(query.page(matching, |p| p.deletion.is_deleted))
        }

        async fn save_payment(&self, payment: &Payment) -> Result<(), PortError> {
            self.tables
                .write()
                .await
                .payments
                .insert(payment.id, payment.clone());
            Ok(())
        }

        async fn delete_payment(&self, id: PaymentId) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            if tables.payments.remove(&id).is_none() {
                return Err(PortError::not_found("Payment", id));
            }
            tables.applications.retain(|a| a.payment_id != id);
            Ok(())
        }

        async fn applied_total(&self, payment_id: PaymentId) -> Result<Decimal, PortError> {
            Ok(self.tables.read().await.applied_total(payment_id))
        }

        async fn applications(
            &self,
            payment_id: PaymentId,
        ) -> Result<Vec<PaymentApplication>, PortError> {
            let tables = self.tables.read().await;
            let mut found: Vec<PaymentApplication> = tables
                .applications
                .iter()
                .filter(|a| a.payment_id == payment_id)
                .cloned()
                .collect();
            found.sort_by_key(|a| (a.created_at, *a.id.as_uuid()));
            Ok(found)
        }

        async fn commit_allocation(
            &self,
            payment: &Payment,
            application: &PaymentApplication,
            expected_applied_total: Decimal,
        ) -> Result<(), PortError> {
            let mut tables = self.tables.write().await;
            match tables.payments.get(&payment.id) {
                None => return Err(PortError::not_found("Payment", payment.id)),
                Some(stored) if stored.deletion.is_deleted => {
                    return Err(PortError::conflict(format!("payment {} was deleted", payment.id)));
                }
                Some(_) => {}
            }
            if !tables.invoices.contains_key(&application.invoice_id) {
                return Err(PortError::not_found("Invoice", application.invoice_id));
            }
            let current = tables.applied_total(payment.id);
            if current != expected_applied_total {
                return Err(PortError::conflict(format!(
                    "payment {} applied total moved from {} to {}",
                    payment.id, expected_applied_total, current
                )));
            }
            tables.applications.push(application.clone());
            if let Some(stored) = tables
                .payments
                .get_mut(&payment.id)
                .filter(|stored| stored.status != payment.status)
            {
                stored.status = payment.status;
                stored.audit.updated_at = payment.audit.updated_at;
                stored.audit.last_modified_by = payment.audit.last_modified_by;
                stored.audit.version += 1;
            }
            Ok(())
        }
    }
}
