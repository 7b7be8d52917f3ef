//! Unit tests for the Money module
//!
//! Tests cover creation, checked arithmetic, minor-unit rounding,
//! currency parsing and tax rates.

use core_kernel::money::round_half_up;
use core_kernel::{Currency, Money, MoneyError, TaxRate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_from_minor_handles_jpy_no_decimals() {
        let m = Money::from_minor(10000, Currency::JPY);
        assert_eq!(m.amount(), dec!(10000));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::EUR);
        assert!(m.is_zero());
        assert!(!m.is_positive());
        assert!(!m.is_negative());
        assert_eq!(m.currency(), Currency::EUR);
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_add_same_currency() {
        let a = Money::new(dec!(120.00), Currency::USD);
        let b = Money::new(dec!(180.00), Currency::USD);
        assert_eq!(a.checked_add(&b).unwrap().amount(), dec!(300.00));
    }

    #[test]
    fn test_checked_sub_can_reach_zero_and_below() {
        let paid = Money::new(dec!(300.00), Currency::USD);
        let applied = Money::new(dec!(300.00), Currency::USD);
        assert!(paid.checked_sub(&applied).unwrap().is_zero());

        let over = Money::new(dec!(300.01), Currency::USD);
        assert!(paid.checked_sub(&over).unwrap().is_negative());
    }

    #[test]
    fn test_checked_sub_currency_mismatch() {
        let usd = Money::new(dec!(1), Currency::USD);
        let gbp = Money::new(dec!(1), Currency::GBP);
        assert_eq!(
            usd.checked_sub(&gbp),
            Err(MoneyError::CurrencyMismatch("USD".into(), "GBP".into()))
        );
    }

    #[test]
    fn test_checked_add_overflow_is_an_error() {
        let huge = Money::new(Decimal::MAX, Currency::USD);
        let one = Money::new(dec!(1), Currency::USD);
        assert_eq!(huge.checked_add(&huge), Err(MoneyError::Overflow));
        assert_eq!(
            Money::new(Decimal::MIN, Currency::USD).checked_sub(&one),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_sum_of_applications() {
        let applied = [
            Money::new(dec!(120.00), Currency::USD),
            Money::new(dec!(80.00), Currency::USD),
            Money::new(dec!(0.01), Currency::USD),
        ];
        assert_eq!(Money::sum(Currency::USD, &applied).unwrap().amount(), dec!(200.01));
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_round_to_currency_usd() {
        let m = Money::new(dec!(100.555), Currency::USD);
        assert_eq!(m.round_to_currency().amount(), dec!(100.56));
    }

    #[test]
    fn test_round_to_currency_jpy() {
        let m = Money::new(dec!(100.5), Currency::JPY);
        assert_eq!(m.round_to_currency().amount(), dec!(101));
    }

    #[test]
    fn test_midpoint_is_not_bankers() {
        // 0.125 would round to 0.12 under round-half-even
        assert_eq!(round_half_up(dec!(0.125), 2), dec!(0.13));
        assert_eq!(round_half_up(dec!(-0.125), 2), dec!(-0.13));
    }

    #[test]
    fn test_already_rounded_amount_is_unchanged() {
        assert_eq!(Money::rounded(dec!(72.00), Currency::USD).amount(), dec!(72.00));
    }
}

mod currency {
    use super::*;

    #[test]
    fn test_default_is_usd() {
        assert_eq!(Currency::default(), Currency::USD);
    }

    #[test]
    fn test_parse_round_trips_code() {
        for c in [
            Currency::USD,
            Currency::EUR,
            Currency::GBP,
            Currency::JPY,
            Currency::CHF,
            Currency::INR,
            Currency::AUD,
            Currency::CAD,
            Currency::SGD,
            Currency::HKD,
        ] {
            assert_eq!(c.code().parse::<Currency>().unwrap(), c);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!("US".parse::<Currency>().is_err());
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(dec!(1234.5), Currency::USD).to_string(), "$ 1234.50");
        assert_eq!(Money::new(dec!(500), Currency::JPY).to_string(), "¥ 500");
    }
}

mod tax_rate {
    use super::*;

    #[test]
    fn test_tax_on_is_exact() {
        let rate = TaxRate::new(dec!(0.0825));
        assert_eq!(rate.tax_on(dec!(19.99)).unwrap(), dec!(1.649175));
    }

    #[test]
    fn test_tax_on_overflow_is_an_error() {
        let rate = TaxRate::new(TaxRate::MAX);
        assert_eq!(rate.tax_on(Decimal::MAX), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_rate_bound_matches_column() {
        assert!(!TaxRate::new(dec!(99999.9999)).exceeds_max());
        assert!(TaxRate::new(dec!(100000)).exceeds_max());
    }

    #[test]
    fn test_negative_rate_detected() {
        assert!(TaxRate::new(dec!(-0.01)).is_negative());
        assert!(!TaxRate::zero().is_negative());
    }

    #[test]
    fn test_rate_serializes_as_bare_decimal() {
        let rate = TaxRate::new(dec!(0.1));
        let json = serde_json::to_string(&rate).unwrap();
        let back: TaxRate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rate);
        assert_eq!(back.as_decimal(), Decimal::new(1, 1));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_money_json_shape() {
        let m = Money::new(dec!(72.00), Currency::USD);
        let value = serde_json::to_value(m).unwrap();
        assert_eq!(value["currency"], "USD");
        let back: Money = serde_json::from_value(value).unwrap();
        assert_eq!(back, m);
    }
}
