//! Property tests for the monetary line computer

use core_kernel::{Currency, ProductId, TaxRate};
use domain_sales::{compute, LineInput};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

fn line_strategy() -> impl Strategy<Value = LineInput> {
    (1i64..100_000i64, 0i64..10_000_000i64, 0i64..30_000i64).prop_map(|(qty, price, rate)| {
        LineInput::new(
            ProductId::new(),
            Decimal::new(qty, 2),
            Decimal::new(price, 2),
            TaxRate::new(Decimal::new(rate, 4)),
        )
    })
}

proptest! {
    #[test]
    fn total_is_subtotal_plus_tax(lines in prop::collection::vec(line_strategy(), 0..20)) {
        let priced = compute(lines, Currency::USD).unwrap();
        let totals = priced.totals;
        prop_assert_eq!(
            totals.total.amount(),
            totals.subtotal.amount() + totals.tax_total.amount()
        );
    }

    #[test]
    fn subtotal_is_rounded_sum_of_nets(lines in prop::collection::vec(line_strategy(), 0..20)) {
        let expected: Decimal = lines.iter().map(|l| l.quantity * l.unit_price).sum();
        let priced = compute(lines, Currency::USD).unwrap();
        prop_assert_eq!(
            priced.totals.subtotal.amount(),
            expected.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        );
    }

    #[test]
    fn totals_never_negative(lines in prop::collection::vec(line_strategy(), 0..20)) {
        let priced = compute(lines, Currency::USD).unwrap();
        prop_assert!(!priced.totals.total.is_negative());
        prop_assert!(!priced.totals.tax_total.is_negative());
    }

    #[test]
    fn line_order_does_not_change_totals(lines in prop::collection::vec(line_strategy(), 1..10)) {
        let mut reversed = lines.clone();
        reversed.reverse();
        let a = compute(lines, Currency::USD).unwrap();
        let b = compute(reversed, Currency::USD).unwrap();
        prop_assert_eq!(a.totals, b.totals);
    }

    #[test]
    fn non_positive_quantity_always_rejected(
        qty in -100_000i64..=0i64,
        price in 0i64..1_000_000i64
    ) {
        let line = LineInput::new(
            ProductId::new(),
            Decimal::new(qty, 2),
            Decimal::new(price, 2),
            TaxRate::zero(),
        );
        prop_assert!(compute(vec![line], Currency::USD).is_err());
    }
}

#[test]
fn test_jpy_rounds_to_whole_units() {
    let lines = vec![LineInput::new(
        ProductId::new(),
        Decimal::new(3, 0),
        Decimal::new(333, 0),
        TaxRate::new(Decimal::new(8, 2)),
    )];
    let priced = compute(lines, Currency::JPY).unwrap();
    // 999 net, 79.92 tax
    assert_eq!(priced.totals.subtotal.amount(), Decimal::new(999, 0));
    assert_eq!(priced.totals.tax_total.amount(), Decimal::new(80, 0));
    assert_eq!(priced.totals.total.amount(), Decimal::new(1079, 0));
}
