//! Property-Based Test Generators
//!
//! Proptest strategies producing input that passes line and payment
//! validation: quantities and unit prices with two fractional digits, tax
//! rates with four, and amounts in whole minor units.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money, ProductId, TaxRate};
use domain_sales::LineInput;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::CHF),
        Just(Currency::INR),
        Just(Currency::AUD),
        Just(Currency::CAD),
        Just(Currency::SGD),
        Just(Currency::HKD),
    ]
}

/// 0.01 to 10 000.00
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// 0.00 to 99 999.99; zero-priced lines are valid
pub fn unit_price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// 0% to 30% in basis-point steps of 0.01%
pub fn tax_rate_strategy() -> impl Strategy<Value = TaxRate> {
    (0i64..3_000i64).prop_map(|n| TaxRate::new(Decimal::new(n, 4)))
}

/// A product-backed line with arbitrary valid figures
pub fn line_input_strategy() -> impl Strategy<Value = LineInput> {
    (quantity_strategy(), unit_price_strategy(), tax_rate_strategy())
        .prop_map(|(quantity, unit_price, tax_rate)| {
            LineInput::new(ProductId::new(), quantity, unit_price, tax_rate)
        })
}

/// Zero to `max` lines
pub fn lines_strategy(max: usize) -> impl Strategy<Value = Vec<LineInput>> {
    prop::collection::vec(line_input_strategy(), 0..=max)
}

/// A positive amount in whole minor units of `currency`
pub fn amount_strategy(currency: Currency) -> impl Strategy<Value = Decimal> {
    let dp = currency.decimal_places();
    (1i64..100_000_000i64).prop_map(move |n| Decimal::new(n, dp))
}

/// Strategy for generating positive Money values in any currency
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    currency_strategy().prop_flat_map(|currency| {
        amount_strategy(currency).prop_map(move |amount| Money::new(amount, currency))
    })
}

/// A payment amount and a sequence of application attempts against it
///
/// Attempts are drawn up to the full amount each, so later ones regularly
/// overshoot whatever balance is left.
pub fn payment_split_strategy(
    currency: Currency,
) -> impl Strategy<Value = (Decimal, Vec<Decimal>)> {
    let dp = currency.decimal_places();
    (1i64..1_000_000i64).prop_flat_map(move |total_minor| {
        let attempts = prop::collection::vec(1i64..=total_minor, 1..8).prop_map(move |minors| {
            minors
                .into_iter()
                .map(|n| Decimal::new(n, dp))
                .collect::<Vec<_>>()
        });
        (Just(Decimal::new(total_minor, dp)), attempts)
    })
}
