//! PostgreSQL Customer Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, ListQuery, PortError,
};
use domain_party::{Customer, CustomerPort};

use super::{db_to_port_error, ping};
use crate::error::DatabaseError;
use crate::repositories::customer::{CustomerRepository, CustomerRow};
use crate::repositories::{decode, AuditColumns};

/// PostgreSQL-backed implementation of [`CustomerPort`]
///
/// Hard deletes cascade through the schema to the customer's orders,
/// invoices and payments.
#[derive(Debug, Clone)]
pub struct PostgresCustomerAdapter {
    repository: CustomerRepository,
    pool: PgPool,
}

impl PostgresCustomerAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CustomerRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresCustomerAdapter {}

#[async_trait]
impl HealthCheckable for PostgresCustomerAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-customer-adapter").await
    }
}

#[async_trait]
impl CustomerPort for PostgresCustomerAdapter {
    #[instrument(skip(self), fields(customer_id = %id))]
    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        debug!("fetching customer");
        let row = self
            .repository
            .get(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Customer", id, e))?;
        Ok(row_to_customer(row)?)
    }

    #[instrument(skip(self))]
    async fn list_customers(&self, query: ListQuery) -> Result<Vec<Customer>, PortError> {
        let rows = self.repository.list(&query).await?;
        Ok(rows
            .into_iter()
            .map(row_to_customer)
            .collect::<Result<Vec<_>, _>>()?)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn save_customer(&self, customer: &Customer) -> Result<(), PortError> {
        self.repository.upsert(&customer_to_row(customer)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    async fn delete_customer(&self, id: CustomerId) -> Result<(), PortError> {
        self.repository
            .delete(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Customer", id, e))
    }
}

fn row_to_customer(row: CustomerRow) -> Result<Customer, DatabaseError> {
    let currency: Currency = decode("customers.currency", &row.currency)?;
    let (audit, deletion) = row.audit.into_domain();
    Ok(Customer {
        id: CustomerId::from(row.id),
        external_ref: row.external_ref,
        name: row.name,
        email: row.email,
        phone: row.phone,
        billing_address: row.billing_address,
        shipping_address: row.shipping_address,
        currency,
        is_active: row.is_active,
        audit,
        deletion,
    })
}

fn customer_to_row(customer: &Customer) -> CustomerRow {
    CustomerRow {
        id: *customer.id.as_uuid(),
        external_ref: customer.external_ref.clone(),
        name: customer.name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
        billing_address: customer.billing_address.clone(),
        shipping_address: customer.shipping_address.clone(),
        currency: customer.currency.code().to_string(),
        is_active: customer.is_active,
        audit: AuditColumns::from_domain(&customer.audit, &customer.deletion),
    }
}
