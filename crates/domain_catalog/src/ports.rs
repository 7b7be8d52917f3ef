//! Catalog Domain Ports
//!
//! The line computer resolves product references through [`ProductPort`]
//! before any order or invoice is written.

use async_trait::async_trait;

use core_kernel::{DomainPort, ListQuery, PortError, ProductId};

use crate::product::Product;

#[async_trait]
pub trait ProductPort: DomainPort {
    /// Retrieves a product by ID, or `PortError::NotFound`
    async fn get_product(&self, id: ProductId) -> Result<Product, PortError>;

    /// Finds the product holding `sku`, deleted or not
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, PortError>;

    async fn list_products(&self, query: ListQuery) -> Result<Vec<Product>, PortError>;

    /// Inserts or replaces the product row
    ///
    /// Stores enforce SKU uniqueness and answer a collision with
    /// `PortError::Conflict`.
    async fn save_product(&self, product: &Product) -> Result<(), PortError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), PortError>;
}

/// Mock implementation of ProductPort for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default, Clone)]
    pub struct MockProductPort {
        products: Arc<RwLock<HashMap<ProductId, Product>>>,
    }

    impl MockProductPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_products(products: Vec<Product>) -> Self {
            let map = products.into_iter().map(|p| (p.id, p)).collect();
            Self {
                products: Arc::new(RwLock::new(map)),
            }
        }
    }

    impl DomainPort for MockProductPort {}

    #[async_trait]
    impl ProductPort for MockProductPort {
        async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
            self.products
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Product", id))
        }

        async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, PortError> {
            Ok(self
                .products
                .read()
                .await
                .values()
                .find(|p| p.sku == sku)
                .cloned())
        }

        async fn list_products(&self, query: ListQuery) -> Result<Vec<Product>, PortError> {
            let products = self.products.read().await;
            let mut all: Vec<Product> = products.values().cloned().collect();
            all.sort_by_key(|p| (p.audit.created_at, *p.id.as_uuid()));
            Ok(query.page(all, |p| p.deletion.is_deleted))
        }

        async fn save_product(&self, product: &Product) -> Result<(), PortError> {
            let mut products = self.products.write().await;
            if products
                .values()
                .any(|p| p.sku == product.sku && p.id != product.id)
            {
                return Err(PortError::conflict(format!(
                    "sku {} already exists",
                    product.sku
                )));
            }
            products.insert(product.id, product.clone());
            Ok(())
        }

        async fn delete_product(&self, id: ProductId) -> Result<(), PortError> {
            self.products
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| PortError::not_found("Product", id))
        }
    }
}
