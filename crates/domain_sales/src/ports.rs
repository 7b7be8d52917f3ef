//! Sales Domain Ports
//!
//! [`OrderPort`] persists an order together with its lines. `save_order` is
//! a single unit of work: the header and the full line set are written, and
//! any previous lines are removed, or nothing changes.

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, ListQuery, OrderId, PortError};

use crate::order::Order;

#[async_trait]
pub trait OrderPort: DomainPort {
    /// Retrieves an order with its lines, or `PortError::NotFound`
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError>;

    /// Lists orders by creation time, optionally for one customer
    async fn list_orders(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Order>, PortError>;

    /// Upserts the order header and replaces its lines atomically
    async fn save_order(&self, order: &Order) -> Result<(), PortError>;

    /// Permanently removes the order and its lines
    async fn delete_order(&self, id: OrderId) -> Result<(), PortError>;
}

/// Mock implementation of OrderPort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockOrderPort {
        orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    }

    impl MockOrderPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_orders(orders: Vec<Order>) -> Self {
            let map = orders.into_iter().map(|o| (o.id, o)).collect();
            Self {
                orders: Arc::new(RwLock::new(map)),
            }
        }
    }

    impl DomainPort for MockOrderPort {}

    #[async_trait]
    impl OrderPort for MockOrderPort {
        async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
            self.orders
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Order", id))
        }

        async fn list_orders(
            &self,
            customer_id: Option<CustomerId>,
            query: ListQuery,
        ) -> Result<Vec<Order>, PortError> {
            let orders = self.orders.read().await;
            let mut matching: Vec<Order> = orders
                .values()
                .filter(|o| customer_id.map_or(true, |c| o.customer_id == c))
                .cloned()
                .collect();
            matching.sort_by_key(|o| (o.audit.created_at, *o.id.as_uuid()));
            Ok(query.page(matching, |o| o.deletion.is_deleted))
        }

        async fn save_order(&self, order: &Order) -> Result<(), PortError> {
            self.orders.write().await.insert(order.id, order.clone());
            Ok(())
        }

        async fn delete_order(&self, id: OrderId) -> Result<(), PortError> {
            self.orders
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Order", id))
        }
    }
}
