//! HTTP API Layer
//!
//! REST surface of the order-to-cash engine, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per resource, thin wrappers over the domain services
//! - **Middleware**: bearer-token authentication and request audit logging
//! - **DTOs**: request bodies and composite responses
//! - **Error Handling**: domain error kinds mapped to status codes
//!
//! Everything under `/api/v1` requires a bearer token; `/health` and
//! `/health/ready` do not.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::postgres(pool, config);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_billing::{InvoicePort, InvoiceService, PaymentPort, PaymentService};
use domain_catalog::{ProductPort, ProductService};
use domain_party::{CustomerPort, CustomerService};
use domain_sales::{OrderPort, OrderService};
use infra_db::{
    PostgresBillingStore, PostgresCustomerAdapter, PostgresOrderAdapter, PostgresProductAdapter,
};

use crate::config::ApiConfig;
use crate::handlers::{customers, health, invoices, orders, payments, products};
use crate::middleware::{audit_middleware, auth_middleware};

/// The storage the services run against
#[derive(Clone)]
pub struct Ports {
    pub customers: Arc<dyn CustomerPort>,
    pub products: Arc<dyn ProductPort>,
    pub orders: Arc<dyn OrderPort>,
    pub invoices: Arc<dyn InvoicePort>,
    pub payments: Arc<dyn PaymentPort>,
    /// Adapters polled by `/health/ready`
    pub health: Vec<Arc<dyn HealthCheckable>>,
}

impl Ports {
    /// Postgres adapters sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        let customers = Arc::new(PostgresCustomerAdapter::new(pool.clone()));
        let products = Arc::new(PostgresProductAdapter::new(pool.clone()));
        let orders = Arc::new(PostgresOrderAdapter::new(pool.clone()));
        let billing = Arc::new(PostgresBillingStore::new(pool));

        Self {
            customers: customers.clone(),
            products: products.clone(),
            orders: orders.clone(),
            invoices: billing.clone(),
            payments: billing.clone(),
            health: vec![
                customers as Arc<dyn HealthCheckable>,
                products as Arc<dyn HealthCheckable>,
                orders as Arc<dyn HealthCheckable>,
                billing as Arc<dyn HealthCheckable>,
            ],
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub customers: Arc<CustomerService>,
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
    pub health: Vec<Arc<dyn HealthCheckable>>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(ports: Ports, config: ApiConfig) -> Self {
        Self {
            customers: Arc::new(CustomerService::new(ports.customers.clone())),
            products: Arc::new(ProductService::new(ports.products.clone())),
            orders: Arc::new(OrderService::new(
                ports.orders.clone(),
                ports.customers.clone(),
                ports.products.clone(),
            )),
            invoices: Arc::new(InvoiceService::new(
                ports.invoices.clone(),
                ports.orders,
                ports.customers.clone(),
                ports.products,
            )),
            payments: Arc::new(PaymentService::new(
                ports.payments,
                ports.invoices,
                ports.customers,
            )),
            health: ports.health,
            config,
        }
    }

    pub fn postgres(pool: PgPool, config: ApiConfig) -> Self {
        Self::new(Ports::postgres(pool), config)
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let customer_routes = Router::new()
        .route("/", post(customers::create_customer).get(customers::list_customers))
        .route(
            "/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/:id/restore", post(customers::restore_customer));

    let product_routes = Router::new()
        .route("/", post(products::create_product).get(products::list_products))
        .route(
            "/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/:id/restore", post(products::restore_product));

    let order_routes = Router::new()
        .route("/", post(orders::create_order).get(orders::list_orders))
        .route(
            "/:id",
            get(orders::get_order).put(orders::update_order).delete(orders::delete_order),
        )
        .route("/:id/lines", put(orders::replace_lines))
        .route("/:id/confirm", post(orders::confirm_order))
        .route("/:id/fulfill", post(orders::fulfill_order))
        .route("/:id/close", post(orders::close_order))
        .route("/:id/transition", post(orders::transition_order))
        .route("/:id/restore", post(orders::restore_order));

    let invoice_routes = Router::new()
        .route("/", post(invoices::create_invoice).get(invoices::list_invoices))
        .route(
            "/:id",
            get(invoices::get_invoice)
                .put(invoices::update_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/:id/lines", put(invoices::replace_lines))
        .route("/:id/tax", put(invoices::override_tax))
        .route("/:id/post", post(invoices::post_invoice))
        .route("/:id/write-off", post(invoices::write_off_invoice))
        .route("/:id/restore", post(invoices::restore_invoice));

    let payment_routes = Router::new()
        .route("/", post(payments::create_payment).get(payments::list_payments))
        .route("/:id", get(payments::get_payment).delete(payments::delete_payment))
        .route("/:id/apply", post(payments::apply_payment))
        .route("/:id/applications", get(payments::list_applications))
        .route("/:id/restore", post(payments::restore_payment));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/customers", customer_routes)
        .nest("/products", product_routes)
        .nest("/orders", order_routes)
        .nest("/invoices", invoice_routes)
        .nest("/payments", payment_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
