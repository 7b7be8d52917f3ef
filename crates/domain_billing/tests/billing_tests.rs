//! Invoice and allocation rules exercised through the public API

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{
    Actor, Currency, CustomerId, ErrorKind, OrderId, SoftDeletable, TaxRate, UserId,
};
use domain_billing::{
    allocate, Invoice, InvoiceDetails, InvoiceStatus, LineSource, Payment, PaymentDetails,
    PaymentStatus,
};
use domain_sales::{compute, LineInput};

fn actor() -> Actor {
    Actor::new(UserId::new())
}

fn invoice(currency: Currency, lines: Vec<LineInput>) -> Invoice {
    Invoice::new(
        &actor(),
        CustomerId::new(),
        None,
        currency,
        compute(lines, currency).unwrap(),
        None,
        InvoiceDetails::default(),
    )
    .unwrap()
}

mod invoice_tests {
    use super::*;

    #[test]
    fn test_invoice_links_order() {
        let order_id = OrderId::new();
        let inv = Invoice::new(
            &actor(),
            CustomerId::new(),
            Some(order_id),
            Currency::GBP,
            compute(vec![], Currency::GBP).unwrap(),
            None,
            InvoiceDetails {
                notes: Some("March".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(inv.order_id, Some(order_id));
        assert_eq!(inv.notes.as_deref(), Some("March"));
        assert!(inv.total.is_zero());
    }

    #[test]
    fn test_priced_currency_must_match() {
        let err = Invoice::new(
            &actor(),
            CustomerId::new(),
            None,
            Currency::USD,
            compute(vec![], Currency::EUR).unwrap(),
            None,
            InvoiceDetails::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_soft_delete_restore_keeps_business_fields() {
        let a = actor();
        let mut inv = invoice(
            Currency::USD,
            vec![LineInput::described("Hours", dec!(4), dec!(25.00), TaxRate::new(dec!(0.2)))],
        );
        inv.transition(&a, InvoiceStatus::Posted).unwrap();
        let before = inv.clone();

        inv.soft_delete(&a).unwrap();
        assert!(inv.is_deleted());
        inv.restore(&a).unwrap();

        assert_eq!(inv.total, before.total);
        assert_eq!(inv.status, InvoiceStatus::Posted);
        assert_eq!(inv.lines, before.lines);
        assert!(!inv.deletion.is_deleted);
        assert!(inv.deletion.deleted_by.is_none());
        assert_eq!(inv.audit.version, before.audit.version + 2);
    }

    #[test]
    fn test_explicit_empty_lines_are_a_source() {
        match LineSource::from_request(Some(vec![]), None).unwrap() {
            LineSource::Explicit(lines) => assert!(lines.is_empty()),
            other => panic!("unexpected source: {other:?}"),
        }
    }
}

mod allocation_tests {
    use super::*;

    #[test]
    fn test_allocations_up_to_the_amount() {
        let a = actor();
        let inv = invoice(Currency::USD, vec![]);
        let details = PaymentDetails::default();
        let payment =
            Payment::new(&a, inv.customer_id, dec!(100.00), Currency::USD, details).unwrap();

        let mut applied = Decimal::ZERO;
        let mut current = payment;
        for amount in [dec!(33.33), dec!(33.33), dec!(33.34)] {
            let allocation = allocate(&a, &current, &inv, applied, amount).unwrap();
            applied += allocation.application.amount_applied.amount();
            current = allocation.payment;
        }
        assert_eq!(applied, dec!(100.00));
        assert_eq!(current.status, PaymentStatus::Applied);

        let err = allocate(&a, &current, &inv, applied, dec!(0.01)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvariantViolation);
    }

    proptest! {
        #[test]
        fn prop_allocation_never_exceeds_payment(
            amount_cents in 1i64..1_000_000,
            requests in prop::collection::vec(1i64..500_000, 1..12),
        ) {
            let a = actor();
            let inv = invoice(Currency::USD, vec![]);
            let amount = Decimal::new(amount_cents, 2);
            let details = PaymentDetails::default();
            let mut payment =
                Payment::new(&a, inv.customer_id, amount, Currency::USD, details).unwrap();

            let mut applied = Decimal::ZERO;
            for cents in requests {
                let request = Decimal::new(cents, 2);
                match allocate(&a, &payment, &inv, applied, request) {
                    Ok(allocation) => {
                        applied += request;
                        prop_assert_eq!(allocation.remaining.amount(), amount - applied);
                        payment = allocation.payment;
                    }
                    Err(e) => {
                        prop_assert_eq!(e.kind(), ErrorKind::InvariantViolation);
                        prop_assert!(request > amount - applied);
                    }
                }
                prop_assert!(applied <= amount);
            }
            prop_assert_eq!(payment.status == PaymentStatus::Applied, applied == amount);
        }
    }
}
