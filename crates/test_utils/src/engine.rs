//! In-memory engine
//!
//! Every service wired to the mock ports the way `interface_api` wires them
//! to Postgres, plus shortcuts for the setup most scenarios repeat.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Actor, Currency};
use domain_billing::{
    InMemoryBillingStore, Invoice, InvoiceService, Payment, PaymentService,
};
use domain_catalog::{MockProductPort, Product, ProductService};
use domain_party::{Customer, CustomerService, MockCustomerPort};
use domain_sales::{LineInput, MockOrderPort, Order, OrderService};

use crate::builders::{
    CustomerBuilder, InvoiceRequestBuilder, OrderRequestBuilder, PaymentRequestBuilder,
    ProductBuilder,
};
use crate::fixtures::{actor, LineFixtures};

/// All services over shared in-memory storage
pub struct TestEngine {
    pub actor: Actor,
    pub customers: CustomerService,
    pub products: ProductService,
    pub orders: OrderService,
    pub invoices: InvoiceService,
    pub payments: PaymentService,
    pub billing_store: Arc<InMemoryBillingStore>,
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngine {
    pub fn new() -> Self {
        let customer_port = Arc::new(MockCustomerPort::new());
        let product_port = Arc::new(MockProductPort::new());
        let order_port = Arc::new(MockOrderPort::new());
        let billing_store = Arc::new(InMemoryBillingStore::new());

        Self {
            actor: actor(),
            customers: CustomerService::new(customer_port.clone()),
            products: ProductService::new(product_port.clone()),
            orders: OrderService::new(
                order_port.clone(),
                customer_port.clone(),
                product_port.clone(),
            ),
            invoices: InvoiceService::new(
                billing_store.clone(),
                order_port,
                customer_port.clone(),
                product_port,
            ),
            payments: PaymentService::new(
                billing_store.clone(),
                billing_store.clone(),
                customer_port,
            ),
            billing_store,
        }
    }

    /// A USD customer
    pub async fn customer(&self) -> Customer {
        self.customer_in(Currency::USD).await
    }

    pub async fn customer_in(&self, currency: Currency) -> Customer {
        self.customers
            .create(&self.actor, CustomerBuilder::new().with_currency(currency).build())
            .await
            .expect("customer fixture should be valid")
    }

    pub async fn product(&self, sku: &str, price: Decimal) -> Product {
        self.products
            .create(&self.actor, ProductBuilder::new(sku).with_price(price).build())
            .await
            .expect("product fixture should be valid")
    }

    /// The widget (10.00) and gadget (50.00) behind [`LineFixtures::widget_and_gadget`]
    pub async fn widget_and_gadget_lines(&self) -> Vec<LineInput> {
        let widget = self.product(&unique_sku("WID"), dec!(10.00)).await;
        let gadget = self.product(&unique_sku("GAD"), dec!(50.00)).await;
        LineFixtures::widget_and_gadget(widget.id, gadget.id)
    }

    /// A draft order totalling 72.00 for `customer`
    pub async fn standard_order(&self, customer: &Customer) -> Order {
        let lines = self.widget_and_gadget_lines().await;
        self.orders
            .create(&self.actor, OrderRequestBuilder::new(customer.id).with_lines(lines).build())
            .await
            .expect("order fixture should be valid")
    }

    /// A posted invoice with one untaxed service line of `amount`
    pub async fn posted_invoice(&self, customer: &Customer, amount: Decimal) -> Invoice {
        let invoice = self
            .invoices
            .create(
                &self.actor,
                InvoiceRequestBuilder::new(customer.id)
                    .with_lines(LineFixtures::service(amount))
                    .build(),
            )
            .await
            .expect("invoice fixture should be valid");
        self.invoices
            .post(&self.actor, invoice.id)
            .await
            .expect("draft invoice should post")
    }

    pub async fn payment(&self, customer: &Customer, amount: Decimal) -> Payment {
        self.payments
            .create(&self.actor, PaymentRequestBuilder::new(customer.id, amount).build())
            .await
            .expect("payment fixture should be valid")
    }
}

fn unique_sku(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
