//! Pre-built Test Fixtures
//!
//! Fixed values for deterministic assertions plus `fake`-backed generators
//! for data whose exact content does not matter.

use chrono::{DateTime, TimeZone, Utc};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Word;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Actor, Currency, Money, ProductId, TaxRate, UserId};
use domain_catalog::NewProduct;
use domain_party::NewCustomer;
use domain_sales::LineInput;

/// The actor used by tests that do not care who acts
pub static TEST_ACTOR: Lazy<Actor> = Lazy::new(|| {
    Actor::new(UserId::from(Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001)))
});

/// A second, distinct actor for audit-trail assertions
pub static OTHER_ACTOR: Lazy<Actor> = Lazy::new(|| {
    Actor::new(UserId::from(Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002)))
});

pub fn actor() -> Actor {
    *TEST_ACTOR
}

pub fn other_actor() -> Actor {
    *OTHER_ACTOR
}

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// A EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }

    /// JPY has no minor unit
    pub fn jpy_10000() -> Money {
        Money::new(dec!(10000), Currency::JPY)
    }
}

/// Fixed document dates
pub struct DateFixtures;

impl DateFixtures {
    pub fn order_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().unwrap_or_else(Utc::now)
    }

    pub fn invoice_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).single().unwrap_or_else(Utc::now)
    }

    /// Thirty days after [`DateFixtures::invoice_date`]
    pub fn due_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 4, 9, 0, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Canonical line sets with known totals
pub struct LineFixtures;

impl LineFixtures {
    /// `(2 × 10.00 @ 10%) + (1 × 50.00 @ 0%)`: subtotal 70.00, tax 2.00, total 72.00
    pub fn widget_and_gadget(widget: ProductId, gadget: ProductId) -> Vec<LineInput> {
        vec![
            LineInput::new(widget, dec!(2), dec!(10.00), TaxRate::new(dec!(0.10))),
            LineInput::new(gadget, dec!(1), dec!(50.00), TaxRate::zero()),
        ]
    }

    /// Three lines taxed 0.005 each: document tax is 0.02, not 3 × 0.01
    pub fn rounding_sensitive(product: ProductId) -> Vec<LineInput> {
        vec![LineInput::new(product, dec!(1), dec!(0.05), TaxRate::new(dec!(0.10))); 3]
    }

    /// One free-text service line of `amount` with no tax
    pub fn service(amount: Decimal) -> Vec<LineInput> {
        vec![LineInput::described("Professional services", dec!(1), amount, TaxRate::zero())]
    }
}

/// Random but valid customer input
pub fn fake_customer() -> NewCustomer {
    NewCustomer {
        name: CompanyName().fake(),
        email: Some(SafeEmail().fake()),
        phone: Some(PhoneNumber().fake()),
        currency: Some(Currency::USD),
        ..Default::default()
    }
}

/// Random but valid product input; SKUs carry a random suffix so repeated
/// calls do not collide
pub fn fake_product() -> NewProduct {
    let word: String = Word().fake();
    let cents: i64 = (100..100_000).fake();
    NewProduct {
        sku: format!("{}-{}", word.to_uppercase(), Uuid::new_v4().simple()),
        name: word,
        uom: Some("ea".to_string()),
        price: Decimal::new(cents, 2),
        ..Default::default()
    }
}
