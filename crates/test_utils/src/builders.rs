//! Test Data Builders
//!
//! Builders for line items and service requests. Each starts from values
//! that pass validation so a test only states what it is about.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, CustomerId, InvoiceId, OrderId, ProductId, TaxRate, UserId};
use domain_billing::{CreateInvoice, CreatePayment, PaymentMethod};
use domain_catalog::NewProduct;
use domain_party::NewCustomer;
use domain_sales::{CreateOrder, LineInput, OrderStatus};

use crate::fixtures::DateFixtures;

/// Builder for a single order or invoice line
#[derive(Debug, Clone)]
pub struct LineBuilder {
    product_id: Option<ProductId>,
    description: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
    tax_rate: TaxRate,
}

impl Default for LineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuilder {
    /// One unit at 10.00 with no tax and no product
    pub fn new() -> Self {
        Self {
            product_id: None,
            description: None,
            quantity: dec!(1),
            unit_price: dec!(10.00),
            tax_rate: TaxRate::zero(),
        }
    }

    pub fn for_product(product_id: ProductId) -> Self {
        Self::new().with_product(product_id)
    }

    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = unit_price;
        self
    }

    /// Sets the tax rate as a fraction, e.g. `dec!(0.10)` for 10%
    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = TaxRate::new(rate);
        self
    }

    pub fn build(self) -> LineInput {
        LineInput {
            product_id: self.product_id,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            tax_rate: self.tax_rate,
        }
    }
}

/// Builder for customer input
#[derive(Debug, Clone, Default)]
pub struct CustomerBuilder {
    input: NewCustomer,
}

impl CustomerBuilder {
    pub fn new() -> Self {
        Self {
            input: NewCustomer {
                name: "Acme Trading Ltd".to_string(),
                email: Some("billing@acme.example".to_string()),
                currency: Some(Currency::USD),
                ..Default::default()
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.input.name = name.into();
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.input.currency = Some(currency);
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.input.email = Some(email.into());
        self
    }

    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.input.owner = Some(owner);
        self
    }

    pub fn build(self) -> NewCustomer {
        self.input
    }
}

/// Builder for product input
#[derive(Debug, Clone, Default)]
pub struct ProductBuilder {
    input: NewProduct,
}

impl ProductBuilder {
    pub fn new(sku: impl Into<String>) -> Self {
        let sku = sku.into();
        Self {
            input: NewProduct {
                name: format!("Product {sku}"),
                sku,
                uom: Some("ea".to_string()),
                price: dec!(10.00),
                ..Default::default()
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.input.name = name.into();
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.input.price = price;
        self
    }

    pub fn with_tax_code(mut self, tax_code: impl Into<String>) -> Self {
        self.input.tax_code = Some(tax_code.into());
        self
    }

    pub fn build(self) -> NewProduct {
        self.input
    }
}

/// Builder for [`CreateOrder`] requests
#[derive(Debug, Clone)]
pub struct OrderRequestBuilder {
    request: CreateOrder,
}

impl OrderRequestBuilder {
    pub fn new(customer_id: CustomerId) -> Self {
        let mut request = CreateOrder::new(customer_id, Vec::new());
        request.order_date = Some(DateFixtures::order_date());
        Self { request }
    }

    pub fn with_line(mut self, line: LineInput) -> Self {
        self.request.lines.push(line);
        self
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = LineInput>) -> Self {
        self.request.lines.extend(lines);
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.request.currency = Some(currency);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.request.status = Some(status);
        self
    }

    pub fn with_external_ref(mut self, external_ref: impl Into<String>) -> Self {
        self.request.external_ref = Some(external_ref.into());
        self
    }

    pub fn build(self) -> CreateOrder {
        self.request
    }
}

/// Builder for [`CreateInvoice`] requests
#[derive(Debug, Clone)]
pub struct InvoiceRequestBuilder {
    request: CreateInvoice,
}

impl InvoiceRequestBuilder {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            request: CreateInvoice {
                customer_id,
                invoice_date: Some(DateFixtures::invoice_date()),
                due_date: Some(DateFixtures::due_date()),
                ..Default::default()
            },
        }
    }

    /// Lines are copied from the order unless explicit lines are also set
    pub fn from_order(mut self, order_id: OrderId) -> Self {
        self.request.order_id = Some(order_id);
        self
    }

    pub fn with_line(mut self, line: LineInput) -> Self {
        self.request.lines.get_or_insert_with(Vec::new).push(line);
        self
    }

    pub fn with_lines(mut self, lines: impl IntoIterator<Item = LineInput>) -> Self {
        self.request.lines.get_or_insert_with(Vec::new).extend(lines);
        self
    }

    pub fn with_tax_total(mut self, tax_total: Decimal) -> Self {
        self.request.tax_total_override = Some(tax_total);
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.request.currency = Some(currency);
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.request.due_date = Some(due_date);
        self
    }

    pub fn build(self) -> CreateInvoice {
        self.request
    }
}

/// Builder for [`CreatePayment`] requests
#[derive(Debug, Clone)]
pub struct PaymentRequestBuilder {
    request: CreatePayment,
}

impl PaymentRequestBuilder {
    pub fn new(customer_id: CustomerId, amount: Decimal) -> Self {
        let mut request = CreatePayment::new(customer_id, amount);
        request.method = Some(PaymentMethod::BankTransfer);
        Self { request }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.request.currency = Some(currency);
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.request.method = Some(method);
        self
    }

    /// Records the invoice the customer said the payment was for
    pub fn for_invoice(mut self, invoice_id: InvoiceId) -> Self {
        self.request.invoice_id = Some(invoice_id);
        self
    }

    pub fn build(self) -> CreatePayment {
        self.request
    }
}
