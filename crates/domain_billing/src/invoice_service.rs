//! Invoice lifecycle service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{
    Actor, Currency, CustomerId, InvoiceId, ListQuery, Money, OrderId, SoftDeletable, UserId,
};
use domain_catalog::ProductPort;
use domain_party::CustomerPort;
use domain_sales::{price_lines, resolve_customer, LineInput, Order, OrderPort};

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceDetails, InvoiceDetailsUpdate, InvoiceStatus, LineSource};
use crate::ports::InvoicePort;

/// Request to raise an invoice
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub customer_id: CustomerId,
    pub order_id: Option<OrderId>,
    /// Explicit lines; when absent the order's lines are copied
    pub lines: Option<Vec<LineInput>>,
    pub tax_total_override: Option<Decimal>,
    pub invoice_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub currency: Option<Currency>,
    pub external_ref: Option<String>,
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

impl CreateInvoice {
    pub fn with_lines(customer_id: CustomerId, lines: Vec<LineInput>) -> Self {
        Self {
            customer_id,
            lines: Some(lines),
            ..Default::default()
        }
    }

    pub fn for_order(customer_id: CustomerId, order_id: OrderId) -> Self {
        Self {
            customer_id,
            order_id: Some(order_id),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    invoices: Arc<dyn InvoicePort>,
    orders: Arc<dyn OrderPort>,
    customers: Arc<dyn CustomerPort>,
    products: Arc<dyn ProductPort>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn InvoicePort>,
        orders: Arc<dyn OrderPort>,
        customers: Arc<dyn CustomerPort>,
        products: Arc<dyn ProductPort>,
    ) -> Self {
        Self {
            invoices,
            orders,
            customers,
            products,
        }
    }

    #[instrument(
        skip(self, request),
        fields(actor = %actor.user_id, customer_id = %request.customer_id)
    )]
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateInvoice,
    ) -> Result<Invoice, BillingError> {
        let customer = resolve_customer(self.customers.as_ref(), request.customer_id).await?;
        let order = match request.order_id {
            Some(order_id) => Some(self.resolve_order(order_id).await?),
            None => None,
        };

        let source = LineSource::from_request(request.lines, order.as_ref())?;
        let currency = match (&source, &order) {
            (LineSource::CopiedFromOrder(_), Some(order)) => {
                if let Some(requested) = request.currency {
                    if requested != order.currency {
                        return Err(BillingError::validation(format!(
                            "order {} is in {} but {} was requested",
                            order.id, order.currency, requested
                        )));
                    }
                }
                order.currency
            }
            _ => request
                .currency
                .or(order.as_ref().map(|o| o.currency))
                .unwrap_or(customer.currency),
        };

        let copied = source.is_copied();
        let priced = price_lines(source.into_lines(), currency, self.products.as_ref()).await?;
        let invoice = Invoice::new(
            actor,
            customer.id,
            request.order_id,
            currency,
            priced,
            request.tax_total_override,
            InvoiceDetails {
                external_ref: request.external_ref,
                invoice_date: request.invoice_date,
                due_date: request.due_date,
                notes: request.notes,
                owner: request.owner,
            },
        )?;

        self.invoices.save_invoice(&invoice).await?;
        info!(
            invoice_id = %invoice.id,
            total = %invoice.total,
            copied_from_order = copied,
            "invoice created"
        );
        Ok(invoice)
    }

    pub async fn get(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.load(id).await
    }

    pub async fn list(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Invoice>, BillingError> {
        Ok(self.invoices.list_invoices(customer_id, query).await?)
    }

    /// Replaces every line; tax is the override when given, else recomputed
    #[instrument(skip(self, lines), fields(actor = %actor.user_id))]
    pub async fn replace_lines(
        &self,
        actor: &Actor,
        id: InvoiceId,
        lines: Vec<LineInput>,
        tax_total_override: Option<Decimal>,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self.load(id).await?;
        invoice.ensure_not_deleted()?;

        let priced = price_lines(lines, invoice.currency, self.products.as_ref()).await?;
        invoice.replace_lines(actor, priced, tax_total_override)?;

        self.invoices.save_invoice(&invoice).await?;
        info!(invoice_id = %id, total = %invoice.total, "invoice lines replaced");
        Ok(invoice)
    }

    /// Overrides tax on the existing lines
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn override_tax_total(
        &self,
        actor: &Actor,
        id: InvoiceId,
        tax_total: Decimal,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self.load(id).await?;
        invoice.override_tax_total(actor, tax_total)?;
        self.invoices.save_invoice(&invoice).await?;
        info!(invoice_id = %id, tax_total = %invoice.tax_total, "invoice tax overridden");
        Ok(invoice)
    }

    #[instrument(skip(self, update), fields(actor = %actor.user_id))]
    pub async fn update_details(
        &self,
        actor: &Actor,
        id: InvoiceId,
        update: InvoiceDetailsUpdate,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self.load(id).await?;
        invoice.update_details(actor, update)?;
        self.invoices.save_invoice(&invoice).await?;
        Ok(invoice)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn transition(
        &self,
        actor: &Actor,
        id: InvoiceId,
        next: InvoiceStatus,
    ) -> Result<Invoice, BillingError> {
        let mut invoice = self.load(id).await?;
        let from = invoice.status;
        if let Err(e) = invoice.transition(actor, next) {
            warn!(invoice_id = %id, %from, to = %next, error = %e, "invoice transition rejected");
            return Err(e);
        }
        self.invoices.save_invoice(&invoice).await?;
        info!(invoice_id = %id, %from, to = %next, "invoice transitioned");
        Ok(invoice)
    }

    pub async fn post(&self, actor: &Actor, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.transition(actor, id, InvoiceStatus::Posted).await
    }

    pub async fn write_off(&self, actor: &Actor, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.transition(actor, id, InvoiceStatus::WrittenOff).await
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn soft_delete(&self, actor: &Actor, id: InvoiceId) -> Result<Invoice, BillingError> {
        let mut invoice = self.load(id).await?;
        invoice.soft_delete(actor)?;
        self.invoices.save_invoice(&invoice).await?;
        info!(invoice_id = %id, "invoice soft-deleted");
        Ok(invoice)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn restore(&self, actor: &Actor, id: InvoiceId) -> Result<Invoice, BillingError> {
        let mut invoice = self.load(id).await?;
        invoice.restore(actor)?;
        self.invoices.save_invoice(&invoice).await?;
        info!(invoice_id = %id, "invoice restored");
        Ok(invoice)
    }

    /// Removes the invoice together with its lines and payment applications
    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn hard_delete(&self, actor: &Actor, id: InvoiceId) -> Result<(), BillingError> {
        self.load(id).await?;
        self.invoices.delete_invoice(id).await?;
        info!(invoice_id = %id, "invoice permanently deleted");
        Ok(())
    }

    /// Total of all payment applications against the invoice
    pub async fn amount_applied(&self, id: InvoiceId) -> Result<Money, BillingError> {
        let invoice = self.load(id).await?;
        let applied = self.invoices.amount_applied_to_invoice(id).await?;
        Ok(Money::rounded(applied, invoice.currency))
    }

    async fn resolve_order(&self, id: OrderId) -> Result<Order, BillingError> {
        self.orders.get_order(id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::invalid_reference("order", id)
            } else {
                BillingError::Port(e)
            }
        })
    }

    async fn load(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.invoices.get_invoice(id).await.map_err(|e| {
            if e.is_not_found() {
                BillingError::InvoiceNotFound(id.to_string())
            } else {
                BillingError::Port(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryBillingStore;
    use core_kernel::{ErrorKind, ProductId, TaxRate};
    use domain_catalog::{MockProductPort, NewProduct, Product};
    use domain_party::{Customer, MockCustomerPort, NewCustomer};
    use domain_sales::{CreateOrder, MockOrderPort, OrderService};
    use rust_decimal_macros::dec;

    struct Harness {
        service: InvoiceService,
        order_service: OrderService,
        store: InMemoryBillingStore,
        actor: Actor,
        customer: Customer,
        widget: Product,
        gadget: Product,
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
        let product = |sku: &str, price| {
            Product::create(
                &actor,
                NewProduct {
                    sku: sku.to_string(),
                    name: sku.to_string(),
                    price,
                    ..Default::default()
                },
            )
            .unwrap()
        };
        let widget = product("WID", dec!(10.00));
        let gadget = product("GAD", dec!(50.00));

        let customers: Arc<dyn CustomerPort> =
            Arc::new(MockCustomerPort::with_customers(vec![customer.clone()]));
        let products: Arc<dyn ProductPort> =
            Arc::new(MockProductPort::with_products(vec![widget.clone(), gadget.clone()]));
        let orders: Arc<dyn OrderPort> = Arc::new(MockOrderPort::new());
        let store = InMemoryBillingStore::new();

        Harness {
            service: InvoiceService::new(
                Arc::new(store.clone()),
                orders.clone(),
                customers.clone(),
                products.clone(),
            ),
            order_service: OrderService::new(orders, customers, products),
            store,
            actor,
            customer,
            widget,
            gadget,
        }
    }

    fn standard_lines(h: &Harness) -> Vec<LineInput> {
        vec![
            LineInput::new(h.widget.id, dec!(2), dec!(10.00), TaxRate::new(dec!(0.10))),
            LineInput::new(h.gadget.id, dec!(1), dec!(50.00), TaxRate::zero()),
        ]
    }

    async fn order(h: &Harness) -> Order {
        h.order_service
            .create(&h.actor, CreateOrder::new(h.customer.id, standard_lines(h)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_with_explicit_lines() {
        let h = harness();
        let invoice = h
            .service
            .create(&h.actor, CreateInvoice::with_lines(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.total.amount(), dec!(72.00));
        assert_eq!(h.store.get_invoice(invoice.id).await.unwrap(), invoice);
    }

    #[tokio::test]
    async fn test_create_copies_order_lines_point_in_time() {
        let h = harness();
        let order = order(&h).await;
        let invoice = h
            .service
            .create(&h.actor, CreateInvoice::for_order(h.customer.id, order.id))
            .await
            .unwrap();
        assert_eq!(invoice.order_id, Some(order.id));
        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.total, order.total);

        h.order_service
            .replace_lines(
                &h.actor,
                order.id,
                vec![LineInput::new(h.widget.id, dec!(9), dec!(10.00), TaxRate::zero())],
            )
            .await
            .unwrap();

        let reloaded = h.service.get(invoice.id).await.unwrap();
        assert_eq!(reloaded.total.amount(), dec!(72.00));
        assert_eq!(reloaded.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_lines_win_over_order() {
        let h = harness();
        let order = order(&h).await;
        let request = CreateInvoice {
            lines: Some(vec![]),
            ..CreateInvoice::for_order(h.customer.id, order.id)
        };
        let invoice = h.service.create(&h.actor, request).await.unwrap();
        assert!(invoice.lines.is_empty());
        assert!(invoice.total.is_zero());
    }

    #[tokio::test]
    async fn test_neither_lines_nor_order_is_validation_error() {
        let h = harness();
        let err = h
            .service
            .create(
                &h.actor,
                CreateInvoice {
                    customer_id: h.customer.id,
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unknown_references() {
        let h = harness();
        let err = h
            .service
            .create(&h.actor, CreateInvoice::with_lines(CustomerId::new(), vec![]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);

        let err = h
            .service
            .create(&h.actor, CreateInvoice::for_order(h.customer.id, OrderId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);

        let lines = vec![LineInput::new(ProductId::new(), dec!(1), dec!(1), TaxRate::zero())];
        let err = h
            .service
            .create(&h.actor, CreateInvoice::with_lines(h.customer.id, lines))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert!(h.store.list_invoices(None, ListQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_free_text_lines_allowed() {
        let h = harness();
        let lines = vec![LineInput::described(
            "Consulting",
            dec!(3),
            dec!(100.00),
            TaxRate::zero(),
        )];
        let invoice = h
            .service
            .create(&h.actor, CreateInvoice::with_lines(h.customer.id, lines))
            .await
            .unwrap();
        assert_eq!(invoice.total.amount(), dec!(300.00));
    }

    #[tokio::test]
    async fn test_copy_rejects_conflicting_currency() {
        let h = harness();
        let order = order(&h).await;
        let request = CreateInvoice {
            currency: Some(Currency::EUR),
            ..CreateInvoice::for_order(h.customer.id, order.id)
        };
        let err = h.service.create(&h.actor, request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_tax_override_then_replace_lines() {
        let h = harness();
        let invoice = h
            .service
            .create(
                &h.actor,
                CreateInvoice {
                    tax_total_override: Some(dec!(5.00)),
                    ..CreateInvoice::with_lines(h.customer.id, standard_lines(&h))
                },
            )
            .await
            .unwrap();
        assert_eq!(invoice.total.amount(), dec!(75.00));

        let updated = h
            .service
            .override_tax_total(&h.actor, invoice.id, dec!(0))
            .await
            .unwrap();
        assert_eq!(updated.total.amount(), dec!(70.00));

        let replaced = h
            .service
            .replace_lines(&h.actor, invoice.id, standard_lines(&h), None)
            .await
            .unwrap();
        assert_eq!(replaced.tax_total.amount(), dec!(2.00));
    }

    #[tokio::test]
    async fn test_post_and_write_off() {
        let h = harness();
        let invoice = h
            .service
            .create(&h.actor, CreateInvoice::with_lines(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();
        assert_eq!(
            h.service.post(&h.actor, invoice.id).await.unwrap().status,
            InvoiceStatus::Posted
        );
        assert_eq!(
            h.service.write_off(&h.actor, invoice.id).await.unwrap().status,
            InvoiceStatus::WrittenOff
        );

        let err = h
            .service
            .transition(&h.actor, invoice.id, InvoiceStatus::Paid)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[tokio::test]
    async fn test_deleted_invoice_cannot_transition() {
        let h = harness();
        let invoice = h
            .service
            .create(&h.actor, CreateInvoice::with_lines(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();
        h.service.soft_delete(&h.actor, invoice.id).await.unwrap();

        let err = h.service.post(&h.actor, invoice.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        let visible = h.service.list(None, ListQuery::default()).await.unwrap();
        assert!(visible.is_empty());
        let all = h
            .service
            .list(None, ListQuery::default().including_deleted())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        let restored = h.service.restore(&h.actor, invoice.id).await.unwrap();
        assert_eq!(restored.total, invoice.total);
        assert!(restored.deletion.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_missing_invoice_is_not_found() {
        let h = harness();
        let err = h.service.post(&h.actor, InvoiceId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
