//! PostgreSQL Product Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, ListQuery, PortError, ProductId};
use domain_catalog::{Product, ProductPort};

use super::{db_to_port_error, ping};
use crate::repositories::product::{ProductRepository, ProductRow};
use crate::repositories::AuditColumns;

/// PostgreSQL-backed implementation of [`ProductPort`]
///
/// SKU uniqueness is enforced by the `products.sku` unique index; a
/// collision comes back from `save_product` as `PortError::Conflict`.
#[derive(Debug, Clone)]
pub struct PostgresProductAdapter {
    repository: ProductRepository,
    pool: PgPool,
}

impl PostgresProductAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ProductRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresProductAdapter {}

#[async_trait]
impl HealthCheckable for PostgresProductAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-product-adapter").await
    }
}

#[async_trait]
impl ProductPort for PostgresProductAdapter {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
        self.repository
            .get(*id.as_uuid())
            .await
            .map(row_to_product)
            .map_err(|e| db_to_port_error("Product", id, e))
    }

    #[instrument(skip(self))]
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, PortError> {
        Ok(self.repository.find_by_sku(sku).await?.map(row_to_product))
    }

    #[instrument(skip(self))]
    async fn list_products(&self, query: ListQuery) -> Result<Vec<Product>, PortError> {
        let rows = self.repository.list(&query).await?;
        Ok(rows.into_iter().map(row_to_product).collect())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id, sku = %product.sku))]
    async fn save_product(&self, product: &Product) -> Result<(), PortError> {
        self.repository.upsert(&product_to_row(product)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> Result<(), PortError> {
        self.repository
            .delete(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Product", id, e))
    }
}

fn row_to_product(row: ProductRow) -> Product {
    let (audit, deletion) = row.audit.into_domain();
    Product {
        id: ProductId::from(row.id),
        external_ref: row.external_ref,
        sku: row.sku,
        name: row.name,
        description: row.description,
        uom: row.uom,
        price: row.price,
        tax_code: row.tax_code,
        is_active: row.is_active,
        audit,
        deletion,
    }
}

fn product_to_row(product: &Product) -> ProductRow {
    ProductRow {
        id: *product.id.as_uuid(),
        external_ref: product.external_ref.clone(),
        sku: product.sku.clone(),
        name: product.name.clone(),
        description: product.description.clone(),
        uom: product.uom.clone(),
        price: product.price,
        tax_code: product.tax_code.clone(),
        is_active: product.is_active,
        audit: AuditColumns::from_domain(&product.audit, &product.deletion),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Actor, UserId};
    use domain_catalog::NewProduct;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_row_round_trip() {
        let product = Product::create(
            &Actor::new(UserId::new()),
            NewProduct {
                sku: "WID-001".to_string(),
                name: "Widget".to_string(),
                uom: Some("ea".to_string()),
                price: dec!(12.50),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(row_to_product(product_to_row(&product)), product);
    }
}
