//! Payment service
//!
//! Records payments and allocates them to invoices. An allocation reads the
//! payment's applied total, decides with [`allocate`], and hands the result
//! to [`PaymentPort::commit_allocation`], which refuses to write if another
//! allocation landed in between. A refused allocation is reported as an
//! invariant violation and is not retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{
    Actor, Currency, CustomerId, InvoiceId, ListQuery, Money, PaymentId, SoftDeletable, UserId,
};
use domain_party::CustomerPort;
use domain_sales::resolve_customer;

use crate::allocation::{allocate, Allocation};
use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::payment::{Payment, PaymentApplication, PaymentDetails, PaymentMethod};
use crate::ports::{InvoicePort, PaymentPort};

/// Request to record a payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePayment {
    pub customer_id: CustomerId,
    pub amount: Decimal,
    /// Defaults to the customer's currency
    pub currency: Option<Currency>,
    pub invoice_id: Option<InvoiceId>,
    pub method: Option<PaymentMethod>,
    pub received_date: Option<DateTime<Utc>>,
    pub external_ref: Option<String>,
    pub note: Option<String>,
    pub owner: Option<UserId>,
}

impl CreatePayment {
    pub fn new(customer_id: CustomerId, amount: Decimal) -> Self {
        Self {
            customer_id,
            amount,
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentPort>,
    invoices: Arc<dyn InvoicePort>,
    customers: Arc<dyn CustomerPort>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentPort>,
        invoices: Arc<dyn InvoicePort>,
        customers: Arc<dyn CustomerPort>,
    ) -> Self {
        Self {
            payments,
            invoices,
            customers,
        }
    }

    #[instrument(
        skip(self, request),
        fields(actor = %actor.user_id, customer_id = %request.customer_id)
    )]
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreatePayment,
    ) -> Result<Payment, BillingError> {
        if request.amount <= Decimal::ZERO {
            return Err(BillingError::validation("amount must be greater than zero"));
        }
        let customer = resolve_customer(self.customers.as_ref(), request.customer_id).await?;
        if let Some(invoice_id) = request.invoice_id {
            self.resolve_invoice(invoice_id).await?;
        }

        let currency = request.currency.unwrap_or(customer.currency);
        let payment = Payment::new(
            actor,
            customer.id,
            request.amount,
            currency,
            PaymentDetails {
                invoice_id: request.invoice_id,
                method: request.method,
                received_date: request.received_date,
                external_ref: request.external_ref,
                note: request.note,
                owner: request.owner,
            },
        )?;

        self.payments.save_payment(&payment).await?;
        info!(payment_id = %payment.id, amount = %payment.amount, "payment recorded");
        Ok(payment)
    }

    /// Applies `amount_applied` of the payment to an invoice
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn apply(
        &self,
        actor: &Actor,
        payment_id: PaymentId,
        invoice_id: InvoiceId,
        amount_applied: Decimal,
    ) -> Result<Allocation, BillingError> {
        let payment = self.load(payment_id).await?;
        payment.ensure_not_deleted()?;
        let invoice = self.resolve_invoice(invoice_id).await?;
        let applied_total = self.payments.applied_total(payment_id).await?;

        let allocation = match allocate(actor, &payment, &invoice, applied_total, amount_applied) {
            Ok(allocation) => allocation,
            Err(e) => {
                warn!(
                    %payment_id,
                    %invoice_id,
                    %amount_applied,
                    %applied_total,
                    error = %e,
                    "allocation rejected"
                );
                return Err(e);
            }
        };

        match self
            .payments
            .commit_allocation(
                &allocation.payment,
                &allocation.application,
                allocation.expected_applied_total,
            )
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_conflict() => {
                warn!(%payment_id, %invoice_id, error = %e, "allocation lost a concurrent update");
                return Err(BillingError::invariant(format!(
                    "Payment {payment_id} changed while applying; reload and retry"
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            %payment_id,
            %invoice_id,
            amount_applied = %allocation.application.amount_applied,
            remaining = %allocation.remaining,
            status = %allocation.payment.status,
            "payment applied"
        );
        Ok(allocation)
    }

    /// Amount of the payment not yet allocated
    pub async fn remaining_balance(&self, payment_id: PaymentId) -> Result<Money, BillingError> {
        let payment = self.load(payment_id).await?;
        let applied_total = self.payments.applied_total(payment_id).await?;
        Ok(payment.remaining(applied_total))
    }

    pub async fn applications(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentApplication>, BillingError> {
        self.load(payment_id).await?;
        Ok(self.payments.applications(payment_id).await?)
    }

    pub async fn get(&self, id: PaymentId) -> Result<Payment, BillingError> {
        self.load(id).await
    }

    pub async fn list(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Payment>, BillingError> {
        Ok(self.payments.list_payments(customer_id, query).await?)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn soft_delete(&self, actor: &Actor, id: PaymentId) -> Result<Payment, BillingError> {
        let mut payment = self.load(id).await?;
        payment.soft_delete(actor)?;
        self.payments.save_payment(&payment).await?;
        info!(payment_id = %id, "payment soft-deleted");
        Ok(payment)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn restore(&self, actor: &Actor, id: PaymentId) -> Result<Payment, BillingError> {
        let mut payment = self.load(id).await?;
        payment.restore(actor)?;
        self.payments.save_payment(&payment).await?;
        info!(payment_id = %id, "payment restored");
        Ok(payment)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn hard_delete(&self, actor: &Actor, id: PaymentId) -> Result<(), BillingError> {
        self.load(id).await?;
        self.payments.delete_payment(id).await?;
        info!(payment_id = %id, "payment permanently deleted");
        Ok(())
    }

    async fn resolve_invoice(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.invoices.get_invoice(id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::invalid_reference("invoice", id)
            } else {
                BillingError::Port(e)
            }
        })
    }

    async fn load(&self, id: PaymentId) -> Result<Payment, BillingError> {
        self.payments.get_payment(id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::PaymentNotFound(id.to_string())
            } else {
                BillingError::Port(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::InvoiceStatus;
    use crate::invoice_service::{CreateInvoice, InvoiceService};
    use crate::payment::PaymentStatus;
    use crate::ports::mock::InMemoryBillingStore;
    use core_kernel::{ErrorKind, TaxRate};
    use domain_catalog::MockProductPort;
    use domain_party::{Customer, MockCustomerPort, NewCustomer};
    use domain_sales::{LineInput, MockOrderPort};
    use rust_decimal_macros::dec;

    struct Harness {
        service: PaymentService,
        invoices: InvoiceService,
        store: InMemoryBillingStore,
        actor: Actor,
        customer: Customer,
    }

    fn harness() -> Harness {
        let actor = Actor::new(UserId::new());
        let customer = Customer::create(
            &actor,
            NewCustomer {
                name: "Acme".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let customers: Arc<dyn CustomerPort> =
            Arc::new(MockCustomerPort::with_customers(vec![customer.clone()]));
        let store = InMemoryBillingStore::new();
        Harness {
            service: PaymentService::new(
                Arc::new(store.clone()),
                Arc::new(store.clone()),
                customers.clone(),
            ),
            invoices: InvoiceService::new(
                Arc::new(store.clone()),
                Arc::new(MockOrderPort::new()),
                customers,
                Arc::new(MockProductPort::new()),
            ),
            store,
            actor,
            customer,
        }
    }

    async fn invoice(h: &Harness, amount: Decimal) -> Invoice {
        let lines = vec![LineInput::described("Services", dec!(1), amount, TaxRate::zero())];
        h.invoices
            .create(&h.actor, CreateInvoice::with_lines(h.customer.id, lines))
            .await
            .unwrap()
    }

    async fn payment(h: &Harness, amount: Decimal) -> Payment {
        h.service
            .create(&h.actor, CreatePayment::new(h.customer.id, amount))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_three_invoice_walkthrough() {
        let h = harness();
        let p = payment(&h, dec!(300.00)).await;
        let inv1 = invoice(&h, dec!(120.00)).await;
        let inv2 = invoice(&h, dec!(180.00)).await;
        let inv3 = invoice(&h, dec!(10.00)).await;

        let first = h.service.apply(&h.actor, p.id, inv1.id, dec!(120.00)).await.unwrap();
        assert_eq!(first.remaining.amount(), dec!(180.00));
        assert_eq!(first.payment.status, PaymentStatus::Received);

        let second = h.service.apply(&h.actor, p.id, inv2.id, dec!(180.00)).await.unwrap();
        assert!(second.remaining.is_zero());
        assert_eq!(second.payment.status, PaymentStatus::Applied);

        let err = h.service.apply(&h.actor, p.id, inv3.id, dec!(0.01)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        assert_eq!(h.store.application_count().await, 2);
        assert_eq!(h.service.get(p.id).await.unwrap().status, PaymentStatus::Applied);
        assert_eq!(h.service.remaining_balance(p.id).await.unwrap().amount(), dec!(0));
        assert_eq!(h.service.applications(p.id).await.unwrap().len(), 2);

        // allocation never touches invoice status
        assert_eq!(h.invoices.get(inv2.id).await.unwrap().status, InvoiceStatus::Draft);
    }

    #[tokio::test]
    async fn test_invoice_over_application_is_not_capped() {
        let h = harness();
        let inv = invoice(&h, dec!(50.00)).await;
        let p = payment(&h, dec!(100.00)).await;
        h.service.apply(&h.actor, p.id, inv.id, dec!(100.00)).await.unwrap();
        assert_eq!(h.invoices.amount_applied(inv.id).await.unwrap().amount(), dec!(100.00));
    }

    #[tokio::test]
    async fn test_apply_rejections() {
        let h = harness();
        let p = payment(&h, dec!(100.00)).await;
        let inv = invoice(&h, dec!(100.00)).await;

        let err = h.service.apply(&h.actor, PaymentId::new(), inv.id, dec!(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = h.service.apply(&h.actor, p.id, InvoiceId::new(), dec!(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);

        let err = h.service.apply(&h.actor, p.id, inv.id, dec!(0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        h.service.soft_delete(&h.actor, p.id).await.unwrap();
        let err = h.service.apply(&h.actor, p.id, inv.id, dec!(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        assert_eq!(h.store.application_count().await, 0);
    }

    #[tokio::test]
    async fn test_stale_applied_total_conflicts() {
        let h = harness();
        let p = payment(&h, dec!(100.00)).await;
        let inv = invoice(&h, dec!(100.00)).await;

        // Two allocations decided against the same applied total
        let first = allocate(&h.actor, &p, &inv, dec!(0), dec!(60.00)).unwrap();
        let second = allocate(&h.actor, &p, &inv, dec!(0), dec!(60.00)).unwrap();

        h.store
            .commit_allocation(&first.payment, &first.application, first.expected_applied_total)
            .await
            .unwrap();
        let err = h
            .store
            .commit_allocation(&second.payment, &second.application, second.expected_applied_total)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(h.store.application_count().await, 1);
        assert_eq!(h.service.remaining_balance(p.id).await.unwrap().amount(), dec!(40.00));
    }

    #[tokio::test]
    async fn test_soft_delete_before_commit_rejects_allocation() {
        let h = harness();
        let p = payment(&h, dec!(100.00)).await;
        let inv = invoice(&h, dec!(100.00)).await;

        let pending = allocate(&h.actor, &p, &inv, dec!(0), dec!(40.00)).unwrap();
        h.service.soft_delete(&h.actor, p.id).await.unwrap();

        let err = h
            .store
            .commit_allocation(
                &pending.payment,
                &pending.application,
                pending.expected_applied_total,
            )
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(h.store.application_count().await, 0);

        let stored = h.service.get(p.id).await.unwrap();
        assert!(stored.deletion.is_deleted);
        assert_eq!(stored.deletion.deleted_by, Some(h.actor.user_id));
    }

    #[tokio::test]
    async fn test_commit_keeps_deletion_stamps_written_meanwhile() {
        let h = harness();
        let p = payment(&h, dec!(100.00)).await;
        let inv = invoice(&h, dec!(100.00)).await;
        let other = Actor::new(UserId::new());

        let pending = allocate(&h.actor, &p, &inv, dec!(0), dec!(100.00)).unwrap();
        h.service.soft_delete(&other, p.id).await.unwrap();
        h.service.restore(&other, p.id).await.unwrap();

        h.store
            .commit_allocation(
                &pending.payment,
                &pending.application,
                pending.expected_applied_total,
            )
            .await
            .unwrap();

        let stored = h.service.get(p.id).await.unwrap();
        assert!(!stored.deletion.is_deleted);
        assert_eq!(stored.status, PaymentStatus::Applied);
        assert_eq!(stored.audit.last_modified_by, h.actor.user_id);
        assert_eq!(stored.audit.version, p.audit.version + 3);
    }

    #[tokio::test]
    async fn test_apply_racing_soft_delete_leaves_payment_deleted() {
        let h = harness();
        let p = payment(&h, dec!(100.00)).await;
        let inv = invoice(&h, dec!(100.00)).await;

        let apply = {
            let service = h.service.clone();
            let actor = h.actor;
            tokio::spawn(async move { service.apply(&actor, p.id, inv.id, dec!(25.00)).await })
        };
        let delete = {
            let service = h.service.clone();
            let actor = h.actor;
            tokio::spawn(async move { service.soft_delete(&actor, p.id).await })
        };

        let applied = apply.await.unwrap();
        delete.await.unwrap().unwrap();

        let stored = h.service.get(p.id).await.unwrap();
        assert!(stored.deletion.is_deleted);
        match applied {
            Ok(_) => assert_eq!(h.store.application_count().await, 1),
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::InvariantViolation);
                assert_eq!(h.store.application_count().await, 0);
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_applies_never_overspend() {
        let h = harness();
        let p = payment(&h, dec!(100.00)).await;
        let inv = invoice(&h, dec!(100.00)).await;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = h.service.clone();
                let actor = h.actor;
                tokio::spawn(async move { service.apply(&actor, p.id, inv.id, dec!(30.00)).await })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        let applied: Decimal = h
            .service
            .applications(p.id)
            .await
            .unwrap()
            .iter()
            .map(|a| a.amount_applied.amount())
            .sum();
        assert!(succeeded <= 3);
        assert_eq!(applied, Decimal::from(succeeded) * dec!(30.00));
        assert!(applied <= dec!(100.00));
    }

    #[tokio::test]
    async fn test_invoice_hard_delete_removes_applications() {
        let h = harness();
        let p = payment(&h, dec!(100.00)).await;
        let inv = invoice(&h, dec!(100.00)).await;
        h.service.apply(&h.actor, p.id, inv.id, dec!(40.00)).await.unwrap();

        h.invoices.hard_delete(&h.actor, inv.id).await.unwrap();
        assert!(h.service.applications(p.id).await.unwrap().is_empty());
        assert_eq!(h.service.remaining_balance(p.id).await.unwrap().amount(), dec!(100.00));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let h = harness();
        let err = h
            .service
            .create(&h.actor, CreatePayment::new(h.customer.id, dec!(0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = h
            .service
            .create(&h.actor, CreatePayment::new(CustomerId::new(), dec!(10)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);

        let err = h
            .service
            .create(
                &h.actor,
                CreatePayment {
                    invoice_id: Some(InvoiceId::new()),
                    ..CreatePayment::new(h.customer.id, dec!(10))
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[tokio::test]
    async fn test_soft_delete_restore_round_trip() {
        let h = harness();
        let p = payment(&h, dec!(25.00)).await;
        let deleted = h.service.soft_delete(&h.actor, p.id).await.unwrap();
        assert!(deleted.deletion.is_deleted);
        assert_eq!(deleted.deletion.deleted_by, Some(h.actor.user_id));

        let restored = h.service.restore(&h.actor, p.id).await.unwrap();
        assert_eq!(restored.amount, p.amount);
        assert_eq!(restored.deletion, Default::default());

        let err = h.service.restore(&h.actor, p.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }
}
