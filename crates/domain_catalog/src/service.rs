//! Product maintenance service

use std::sync::Arc;

use tracing::{info, instrument, warn};

use core_kernel::{Actor, ListQuery, PortError, ProductId, SoftDeletable};

use crate::error::CatalogError;
use crate::ports::ProductPort;
use crate::product::{NewProduct, Product, ProductUpdate};

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductPort>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductPort>) -> Self {
        Self { products }
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id, sku = %input.sku))]
    pub async fn create(&self, actor: &Actor, input: NewProduct) -> Result<Product, CatalogError> {
        let product = Product::create(actor, input)?;
        self.ensure_sku_free(&product).await?;
        self.save(&product).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.load(id).await
    }

    pub async fn list(&self, query: ListQuery) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_products(query).await?)
    }

    #[instrument(skip(self, update), fields(actor = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        let mut product = self.load(id).await?;
        product.apply_update(actor, update)?;
        self.ensure_sku_free(&product).await?;
        self.save(&product).await?;
        Ok(product)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn soft_delete(&self, actor: &Actor, id: ProductId) -> Result<Product, CatalogError> {
        let mut product = self.load(id).await?;
        product.soft_delete(actor)?;
        self.save(&product).await?;
        info!(product_id = %id, "product soft-deleted");
        Ok(product)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn restore(&self, actor: &Actor, id: ProductId) -> Result<Product, CatalogError> {
        let mut product = self.load(id).await?;
        product.restore(actor)?;
        self.save(&product).await?;
        info!(product_id = %id, "product restored");
        Ok(product)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn hard_delete(&self, actor: &Actor, id: ProductId) -> Result<(), CatalogError> {
        self.load(id).await?;
        self.products.delete_product(id).await?;
        info!(product_id = %id, "product permanently deleted");
        Ok(())
    }

    async fn ensure_sku_free(&self, product: &Product) -> Result<(), CatalogError> {
        match self.products.find_by_sku(&product.sku).await? {
            Some(existing) if existing.id != product.id => {
                warn!(sku = %product.sku, "duplicate sku rejected");
                Err(CatalogError::DuplicateSku(product.sku.clone()))
            }
            _ => Ok(()),
        }
    }

    async fn save(&self, product: &Product) -> Result<(), CatalogError> {
        self.products.save_product(product).await.map_err(|e| match e {
            PortError::Conflict { .. } => CatalogError::DuplicateSku(product.sku.clone()),
            other => CatalogError::Port(other),
        })
    }

    async fn load(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products.get_product(id).await.map_err(|e| {
            if e.is_not_found() {
                CatalogError::not_found(id)
            } else {
                CatalogError::Port(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::MockProductPort;
    use core_kernel::{ErrorKind, UserId};
    use rust_decimal_macros::dec;

    fn service() -> ProductService {
        ProductService::new(Arc::new(MockProductPort::new()))
    }

    fn product(sku: &str) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            price: dec!(25.00),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let svc = service();
        let actor = Actor::new(UserId::new());
        svc.create(&actor, product("SKU-1")).await.unwrap();

        let err = svc.create(&actor, product("SKU-1")).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSku(_)));
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    #[tokio::test]
    async fn test_rename_sku_onto_existing_rejected() {
        let svc = service();
        let actor = Actor::new(UserId::new());
        svc.create(&actor, product("SKU-1")).await.unwrap();
        let second = svc.create(&actor, product("SKU-2")).await.unwrap();

        let err = svc
            .update(
                &actor,
                second.id,
                ProductUpdate {
                    sku: Some("SKU-1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSku(_)));
        assert_eq!(svc.get(second.id).await.unwrap().sku, "SKU-2");
    }

    #[tokio::test]
    async fn test_update_keeping_own_sku_is_fine() {
        let svc = service();
        let actor = Actor::new(UserId::new());
        let p = svc.create(&actor, product("SKU-9")).await.unwrap();
        let updated = svc
            .update(
                &actor,
                p.id,
                ProductUpdate {
                    price: Some(dec!(30.00)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, dec!(30.00));
        assert_eq!(updated.audit.version, 2);
    }

    #[tokio::test]
    async fn test_soft_deleted_products_drop_out_of_listing() {
        let svc = service();
        let actor = Actor::new(UserId::new());
        let p = svc.create(&actor, product("SKU-3")).await.unwrap();
        svc.soft_delete(&actor, p.id).await.unwrap();

        assert!(svc.list(ListQuery::default()).await.unwrap().is_empty());
        assert!(svc.get(p.id).await.unwrap().deletion.is_deleted);
    }
}
