//! Customer Domain Ports
//!
//! [`CustomerPort`] is everything the rest of the engine needs from customer
//! storage. Sales and billing use only [`CustomerPort::get_customer`] to check
//! that a referenced customer exists; the customer service uses the rest.
//!
//! - **Postgres adapter**: `infra_db::PostgresCustomerAdapter`
//! - **Mock adapter**: [`mock::MockCustomerPort`], enabled by the `mock` feature
//!
//! ```rust,ignore
//! let customers: Arc<dyn CustomerPort> = Arc::new(PostgresCustomerAdapter::new(pool));
//! let customer = customers.get_customer(order.customer_id).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{CustomerId, DomainPort, ListQuery, PortError};

use crate::customer::Customer;

/// Persistence and lookup port for customers
///
/// Lookups resolve soft-deleted customers too; visibility filtering is
/// done through [`ListQuery`] on listings only.
#[async_trait]
pub trait CustomerPort: DomainPort {
    /// Retrieves a customer by ID, or `PortError::NotFound`
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError>;

    /// Lists customers ordered by creation time
    async fn list_customers(&self, query: ListQuery) -> Result<Vec<Customer>, PortError>;

    /// Inserts or replaces the customer row
    async fn save_customer(&self, customer: &Customer) -> Result<(), PortError>;

    /// Permanently removes the customer
    ///
    /// The store cascades the removal to the customer's orders, invoices and
    /// payments.
    async fn delete_customer(&self, id: CustomerId) -> Result<(), PortError>;

    /// Checks if a customer exists
    async fn exists(&self, id: CustomerId) -> Result<bool, PortError> {
        match self.get_customer(id).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Mock implementation of CustomerPort for testing
///
/// Stores customers in memory; useful for unit tests without a database.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory mock implementation of CustomerPort
    #[derive(Debug, Default, Clone)]
    pub struct MockCustomerPort {
        customers: Arc<RwLock<HashMap<CustomerId, Customer>>>,
    }

    impl MockCustomerPort {
        /// Creates a new mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a mock pre-populated with customers
        pub fn with_customers(customers: Vec<Customer>) -> Self {
            let map = customers.into_iter().map(|c| (c.id, c)).collect();
            Self {
                customers: Arc::new(RwLock::new(map)),
            }
        }

        pub async fn len(&self) -> usize {
            self.customers.read().await.len()
        }
    }

    impl DomainPort for MockCustomerPort {}

    #[async_trait]
    impl CustomerPort for MockCustomerPort {
        async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
            self.customers
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Customer", id))
        }

        async fn list_customers(&self, query: ListQuery) -> Result<Vec<Customer>, PortError> {
            let customers = self.customers.read().await;
            let mut all: Vec<Customer> = customers.values().cloned().collect();
            all.sort_by_key(|c| (c.audit.created_at, *c.id.as_uuid()));
            Ok(query.page(all, |c| c.deletion.is_deleted))
        }

        async fn save_customer(&self, customer: &Customer) -> Result<(), PortError> {
            self.customers
                .write()
                .await
                .insert(customer.id, customer.clone());
            Ok(())
        }

        async fn delete_customer(&self, id: CustomerId) -> Result<(), PortError> {
            self.customers
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Customer", id))
        }
    }
}
