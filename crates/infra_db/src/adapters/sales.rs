//! PostgreSQL Order Adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    Currency, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, ListQuery, OrderId,
    OrderLineId, PortError, ProductId, TaxRate,
};
use domain_sales::{Order, OrderLine, OrderPort, OrderStatus};

use super::{db_to_port_error, money, ping};
use crate::error::DatabaseError;
use crate::repositories::order::{OrderLineRow, OrderRepository, OrderRow};
use crate::repositories::{decode, AuditColumns};

/// PostgreSQL-backed implementation of [`OrderPort`]
#[derive(Debug, Clone)]
pub struct PostgresOrderAdapter {
    repository: OrderRepository,
    pool: PgPool,
}

impl PostgresOrderAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: OrderRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresOrderAdapter {}

#[async_trait]
impl HealthCheckable for PostgresOrderAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-order-adapter").await
    }
}

#[async_trait]
impl OrderPort for PostgresOrderAdapter {
    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> Result<Order, PortError> {
        debug!("fetching order");
        let (header, lines) = self
            .repository
            .get(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Order", id, e))?;
        Ok(rows_to_order(header, lines)?)
    }

    #[instrument(skip(self))]
    async fn list_orders(
        &self,
        customer_id: Option<CustomerId>,
        query: ListQuery,
    ) -> Result<Vec<Order>, PortError> {
        let rows = self
            .repository
            .list(customer_id.map(|c| *c.as_uuid()), &query)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(header, lines)| rows_to_order(header, lines))
            .collect::<Result<Vec<_>, _>>()?)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id, lines = order.lines.len()))]
    async fn save_order(&self, order: &Order) -> Result<(), PortError> {
        let (header, lines) = order_to_rows(order);
        self.repository.save(&header, &lines).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn delete_order(&self, id: OrderId) -> Result<(), PortError> {
        self.repository
            .delete(*id.as_uuid())
            .await
            .map_err(|e| db_to_port_error("Order", id, e))
    }
}

fn rows_to_order(header: OrderRow, lines: Vec<OrderLineRow>) -> Result<Order, DatabaseError> {
    let currency: Currency = decode("orders.currency", &header.currency)?;
    let status: OrderStatus = decode("orders.status", &header.status)?;
    let (audit, deletion) = header.audit.into_domain();

    Ok(Order {
        id: OrderId::from(header.id),
        customer_id: CustomerId::from(header.customer_id),
        external_ref: header.external_ref,
        order_date: header.order_date,
        status,
        currency,
        notes: header.notes,
        lines: lines
            .into_iter()
            .map(|line| OrderLine {
                id: OrderLineId::from(line.id),
                order_id: OrderId::from(line.order_id),
                product_id: ProductId::from(line.product_id),
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax_rate: TaxRate::new(line.tax_rate),
                line_total: money(line.line_total, currency),
                created_at: line.created_at,
            })
            .collect(),
        subtotal: money(header.subtotal, currency),
        tax_total: money(header.tax_total, currency),
        total: money(header.total, currency),
        audit,
        deletion,
    })
}

fn order_to_rows(order: &Order) -> (OrderRow, Vec<OrderLineRow>) {
    let header = OrderRow {
        id: *order.id.as_uuid(),
        customer_id: *order.customer_id.as_uuid(),
        external_ref: order.external_ref.clone(),
        order_date: order.order_date,
        status: order.status.as_str().to_string(),
        currency: order.currency.code().to_string(),
        notes: order.notes.clone(),
        subtotal: order.subtotal.amount(),
        tax_total: order.tax_total.amount(),
        total: order.total.amount(),
        audit: AuditColumns::from_domain(&order.audit, &order.deletion),
    };
    let lines = order
        .lines
        .iter()
        .enumerate()
        .map(|(position, line)| OrderLineRow {
            id: *line.id.as_uuid(),
            order_id: *order.id.as_uuid(),
            position: position as i32,
            product_id: *line.product_id.as_uuid(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            tax_rate: line.tax_rate.as_decimal(),
            line_total: line.line_total.amount(),
            created_at: line.created_at,
        })
        .collect();
    (header, lines)
}
