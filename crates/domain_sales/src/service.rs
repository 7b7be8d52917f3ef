//! Order lifecycle service
//!
//! Orchestrates customer and product lookups, line pricing and persistence
//! for sales orders. Every operation validates and prices completely before
//! its single `save_order` call, so a rejected request writes nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{Actor, Currency, CustomerId, ListQuery, OrderId, SoftDeletable, UserId};
use domain_catalog::ProductPort;
use domain_party::{Customer, CustomerPort};

use crate::error::SalesError;
use crate::order::{Order, OrderDetails, OrderDetailsUpdate, OrderStatus};
use crate::ports::OrderPort;
use crate::pricing::{price_lines, LineInput};

/// Request to open a new order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: CustomerId,
    pub lines: Vec<LineInput>,
    /// Defaults to the customer's currency
    pub currency: Option<Currency>,
    pub external_ref: Option<String>,
    pub order_date: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
    pub owner: Option<UserId>,
}

impl CreateOrder {
    pub fn new(customer_id: CustomerId, lines: Vec<LineInput>) -> Self {
        Self {
            customer_id,
            lines,
            currency: None,
            external_ref: None,
            order_date: None,
            status: None,
            notes: None,
            owner: None,
        }
    }
}

/// Resolves a customer reference carried by a request
pub async fn resolve_customer(
    customers: &dyn CustomerPort,
    id: CustomerId,
) -> Result<Customer, SalesError> {
    customers.get_customer(id).await.map_err(|e| {
        if e.is_not_found() {
            SalesError::invalid_reference("customer", id)
        } else {
            SalesError::Port(e)
        }
    })
}

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderPort>,
    customers: Arc<dyn CustomerPort>,
    products: Arc<dyn ProductPort>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderPort>,
        customers: Arc<dyn CustomerPort>,
        products: Arc<dyn ProductPort>,
    ) -> Self {
        Self {
            orders,
            customers,
            products,
        }
    }

    #[instrument(
        skip(self, request),
        fields(actor = %actor.user_id, customer_id = %request.customer_id)
    )]
    pub async fn create(&self, actor: &Actor, request: CreateOrder) -> Result<Order, SalesError> {
        let customer = resolve_customer(self.customers.as_ref(), request.customer_id).await?;
        require_products(&request.lines)?;

        let currency = request.currency.unwrap_or(customer.currency);
        let priced = price_lines(request.lines, currency, self.products.as_ref()).await?;
        let order = Order::new(
            actor,
            customer.id,
            currency,
            priced,
            OrderDetails {
                external_ref: request.external_ref,
                order_date: request.order_date,
                status: request.status,
                notes: request.notes,
                owner: request.owner,
            },
        )?;

        self.orders.save_order(&order).await?;
        info!(order_id = %order.id, total = %order.total, "order created");
        Ok(order)
    }

    pub async fn get(&self, id: OrderId) -> Result<Order, SalesError> {
        self.load(id).await
    }

    pub async fn list(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Order>, SalesError> {
        Ok(self.orders.list_orders(customer_id, query).await?)
    }

    /// Replaces every line of the order and recomputes its totals
    #[instrument(skip(self, lines), fields(actor = %actor.user_id))]
    pub async fn replace_lines(
        &self,
        actor: &Actor,
        id: OrderId,
        lines: Vec<LineInput>,
    ) -> Result<Order, SalesError> {
        let mut order = self.load(id).await?;
        order.ensure_not_deleted()?;
        require_products(&lines)?;

        let priced = price_lines(lines, order.currency, self.products.as_ref()).await?;
        order.replace_lines(actor, priced)?;

        self.orders.save_order(&order).await?;
        info!(order_id = %id, total = %order.total, "order lines replaced");
        Ok(order)
    }

    #[instrument(skip(self, update), fields(actor = %actor.user_id))]
    pub async fn update_details(
        &self,
        actor: &Actor,
        id: OrderId,
        update: OrderDetailsUpdate,
    ) -> Result<Order, SalesError> {
        let mut order = self.load(id).await?;
        order.update_details(actor, update)?;
        self.orders.save_order(&order).await?;
        Ok(order)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn transition(
        &self,
        actor: &Actor,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, SalesError> {
        let mut order = self.load(id).await?;
        let from = order.status;
        if let Err(e) = order.transition(actor, next) {
            warn!(order_id = %id, %from, to = %next, error = %e, "order transition rejected");
            return Err(e);
        }
        self.orders.save_order(&order).await?;
        info!(order_id = %id, %from, to = %next, "order transitioned");
        Ok(order)
    }

    pub async fn confirm(&self, actor: &Actor, id: OrderId) -> Result<Order, SalesError> {
        self.transition(actor, id, OrderStatus::Confirmed).await
    }

    pub async fn fulfill(&self, actor: &Actor, id: OrderId) -> Result<Order, SalesError> {
        self.transition(actor, id, OrderStatus::Fulfilled).await
    }

    pub async fn close(&self, actor: &Actor, id: OrderId) -> Result<Order, SalesError> {
        self.transition(actor, id, OrderStatus::Closed).await
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn soft_delete(&self, actor: &Actor, id: OrderId) -> Result<Order, SalesError> {
        let mut order = self.load(id).await?;
        order.soft_delete(actor)?;
        self.orders.save_order(&order).await?;
        info!(order_id = %id, "order soft-deleted");
        Ok(order)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn restore(&self, actor: &Actor, id: OrderId) -> Result<Order, SalesError> {
        let mut order = self.load(id).await?;
        order.restore(actor)?;
        self.orders.save_order(&order).await?;
        info!(order_id = %id, "order restored");
        Ok(order)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn hard_delete(&self, actor: &Actor, id: OrderId) -> Result<(), SalesError> {
        self.load(id).await?;
        self.orders.delete_order(id).await?;
        info!(order_id = %id, "order permanently deleted");
        Ok(())
    }

    async fn load(&self, id: OrderId) -> Result<Order, SalesError> {
        self.orders.get_order(id).await.map_err(|e| {
            if e.is_not_found() {
                SalesError::OrderNotFound(id.to_string())
            } else {
                SalesError::Port(e)
            }
        })
    }
}

fn require_products(lines: &[LineInput]) -> Result<(), SalesError> {
    match lines.iter().position(|l| l.product_id.is_none()) {
        Some(index) => Err(SalesError::validation(format!(
            "line {}: order lines require a product",
            index + 1
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockOrderPort;
    use core_kernel::{ErrorKind, ProductId, TaxRate};
    use domain_catalog::{MockProductPort, NewProduct, Product};
    use domain_party::{MockCustomerPort, NewCustomer};
    use rust_decimal_macros::dec;

    struct Harness {
        service: OrderService,
        orders: MockOrderPort,
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
        let orders = MockOrderPort::new();
        let service = OrderService::new(
            Arc::new(orders.clone()),
            Arc::new(MockCustomerPort::with_customers(vec![customer.clone()])),
            Arc::new(MockProductPort::with_products(vec![widget.clone(), gadget.clone()])),
        );
        Harness {
            service,
            orders,
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

    #[tokio::test]
    async fn test_create_prices_and_persists() {
        let h = harness();
        let order = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();

        assert_eq!(order.subtotal.amount(), dec!(70.00));
        assert_eq!(order.tax_total.amount(), dec!(2.00));
        assert_eq!(order.total.amount(), dec!(72.00));
        assert_eq!(order.currency, h.customer.currency);
        assert_eq!(order.status, OrderStatus::Draft);
        assert_eq!(order.audit.created_by, h.actor.user_id);
        assert_eq!(h.orders.get_order(order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_invalid_reference() {
        let h = harness();
        let err = h
            .service
            .create(&h.actor, CreateOrder::new(CustomerId::new(), standard_lines(&h)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[tokio::test]
    async fn test_unknown_product_fails_whole_batch() {
        let h = harness();
        let mut lines = standard_lines(&h);
        lines.push(LineInput::new(ProductId::new(), dec!(1), dec!(1), TaxRate::zero()));

        let err = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, lines))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert!(h
            .orders
            .list_orders(None, ListQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_quantity_rejected_before_lookup() {
        let h = harness();
        let lines = vec![LineInput::new(ProductId::new(), dec!(0), dec!(1), TaxRate::zero())];
        let err = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, lines))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_confirm_twice_is_idempotent() {
        let h = harness();
        let order = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();

        for _ in 0..2 {
            let confirmed = h.service.confirm(&h.actor, order.id).await.unwrap();
            assert_eq!(confirmed.status, OrderStatus::Confirmed);
        }
    }

    #[tokio::test]
    async fn test_closed_order_rejects_everything() {
        let h = harness();
        let order = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();
        h.service.close(&h.actor, order.id).await.unwrap();

        let every = [
            OrderStatus::Draft,
            OrderStatus::Confirmed,
            OrderStatus::Fulfilled,
            OrderStatus::Closed,
        ];
        for next in every {
            let err = h.service.transition(&h.actor, order.id, next).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvariantViolation);
        }
        assert_eq!(h.service.get(order.id).await.unwrap().status, OrderStatus::Closed);
    }

    #[tokio::test]
    async fn test_replace_lines_on_deleted_order_rejected() {
        let h = harness();
        let order = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();
        h.service.soft_delete(&h.actor, order.id).await.unwrap();

        let err = h
            .service
            .replace_lines(&h.actor, order.id, standard_lines(&h))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);

        let restored = h.service.restore(&h.actor, order.id).await.unwrap();
        assert_eq!(restored.total, order.total);
        assert!(!restored.deletion.is_deleted);
    }

    #[tokio::test]
    async fn test_replace_lines_with_empty_set_zeroes_totals() {
        let h = harness();
        let order = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();
        let updated = h.service.replace_lines(&h.actor, order.id, vec![]).await.unwrap();
        assert!(updated.lines.is_empty());
        assert!(updated.total.is_zero());
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let h = harness();
        let err = h.service.confirm(&h.actor, OrderId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_hard_delete() {
        let h = harness();
        let order = h
            .service
            .create(&h.actor, CreateOrder::new(h.customer.id, standard_lines(&h)))
            .await
            .unwrap();
        h.service.hard_delete(&h.actor, order.id).await.unwrap();
        assert!(h.orders.get_order(order.id).await.unwrap_err().is_not_found());
    }
}
