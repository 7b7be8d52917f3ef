//! Order-to-cash scenarios across every domain crate
//!
//! These run the services together over the in-memory ports, the same
//! wiring the API uses, and check the cross-domain rules no single crate
//! can check alone.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, ErrorKind, ListQuery};
use domain_billing::{InvoiceStatus, PaymentStatus};
use domain_sales::{OrderDetailsUpdate, OrderStatus};
use test_utils::*;

mod order_to_invoice {
    use super::*;

    #[tokio::test]
    async fn test_invoice_from_order_matches_order_totals() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let order = engine.standard_order(&customer).await;
        assert_totals(&order, dec!(70.00), dec!(2.00), dec!(72.00));

        let order = engine.orders.confirm(&engine.actor, order.id).await.unwrap();
        let invoice = engine
            .invoices
            .create(
                &engine.actor,
                InvoiceRequestBuilder::new(customer.id).from_order(order.id).build(),
            )
            .await
            .unwrap();

        assert_eq!(invoice.order_id, Some(order.id));
        assert_eq!(invoice.line_count(), order.line_count());
        assert_money_eq(&invoice.total, &order.total);
        assert_eq!(invoice.status, InvoiceStatus::Draft);
    }

    #[tokio::test]
    async fn test_order_edits_after_invoicing_do_not_propagate() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let order = engine.standard_order(&customer).await;
        let invoice = engine
            .invoices
            .create(
                &engine.actor,
                InvoiceRequestBuilder::new(customer.id).from_order(order.id).build(),
            )
            .await
            .unwrap();

        let product = engine.product("EXTRA-1", dec!(5.00)).await;
        engine
            .orders
            .replace_lines(
                &engine.actor,
                order.id,
                vec![LineBuilder::for_product(product.id).build()],
            )
            .await
            .unwrap();

        let reloaded = engine.invoices.get(invoice.id).await.unwrap();
        assert_totals(&reloaded, dec!(70.00), dec!(2.00), dec!(72.00));
        assert_eq!(reloaded.line_count(), 2);
    }

    #[tokio::test]
    async fn test_rounding_happens_once_per_document() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let product = engine.product("PENNY-1", dec!(0.05)).await;

        let order = engine
            .orders
            .create(
                &engine.actor,
                OrderRequestBuilder::new(customer.id)
                    .with_lines(LineFixtures::rounding_sensitive(product.id))
                    .build(),
            )
            .await
            .unwrap();

        assert_totals(&order, dec!(0.15), dec!(0.02), dec!(0.17));
    }

    #[tokio::test]
    async fn test_closed_order_is_frozen_but_still_invoiceable() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let order = engine.standard_order(&customer).await;
        engine.orders.close(&engine.actor, order.id).await.unwrap();

        let reopened = engine.orders.transition(&engine.actor, order.id, OrderStatus::Draft).await;
        assert_error_kind(&reopened, ErrorKind::InvariantViolation);

        let invoice = engine
            .invoices
            .create(
                &engine.actor,
                InvoiceRequestBuilder::new(customer.id).from_order(order.id).build(),
            )
            .await
            .unwrap();
        assert_amount(&invoice.total, dec!(72.00));
    }

    #[tokio::test]
    async fn test_details_update_keeps_lines() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let order = engine.standard_order(&customer).await;

        let updated = engine
            .orders
            .update_details(
                &engine.actor,
                order.id,
                OrderDetailsUpdate {
                    notes: Some("Deliver to dock 4".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.notes.as_deref(), Some("Deliver to dock 4"));
        assert_eq!(updated.lines.len(), 2);
        assert!(updated.audit.version > order.audit.version);
    }
}

mod invoice_to_cash {
    use super::*;

    #[tokio::test]
    async fn test_payment_spread_over_three_invoices() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let first = engine.posted_invoice(&customer, dec!(120.00)).await;
        let second = engine.posted_invoice(&customer, dec!(180.00)).await;
        let third = engine.posted_invoice(&customer, dec!(50.00)).await;
        let payment = engine.payment(&customer, dec!(300.00)).await;

        let allocation = engine
            .payments
            .apply(&engine.actor, payment.id, first.id, dec!(120.00))
            .await
            .unwrap();
        assert_amount(&allocation.remaining, dec!(180.00));
        assert_eq!(allocation.payment.status, PaymentStatus::Received);

        let allocation = engine
            .payments
            .apply(&engine.actor, payment.id, second.id, dec!(180.00))
            .await
            .unwrap();
        assert_money_zero(&allocation.remaining);
        assert_eq!(allocation.payment.status, PaymentStatus::Applied);

        let overspend = engine
            .payments
            .apply(&engine.actor, payment.id, third.id, dec!(0.01))
            .await;
        assert_error_kind(&overspend, ErrorKind::InvariantViolation);

        assert_eq!(engine.payments.applications(payment.id).await.unwrap().len(), 2);
        assert_amount(&engine.invoices.amount_applied(second.id).await.unwrap(), dec!(180.00));
        assert_money_zero(&engine.invoices.amount_applied(third.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_fully_paid_invoice_stays_posted() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let invoice = engine.posted_invoice(&customer, dec!(100.00)).await;
        let payment = engine.payment(&customer, dec!(100.00)).await;

        engine
            .payments
            .apply(&engine.actor, payment.id, invoice.id, dec!(100.00))
            .await
            .unwrap();

        let invoice = engine.invoices.get(invoice.id).await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Posted);
    }

    #[tokio::test]
    async fn test_currency_mismatch_rejected() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let invoice = engine.posted_invoice(&customer, dec!(100.00)).await;
        let payment = engine
            .payments
            .create(
                &engine.actor,
                PaymentRequestBuilder::new(customer.id, dec!(100.00))
                    .with_currency(Currency::EUR)
                    .build(),
            )
            .await
            .unwrap();

        let result = engine
            .payments
            .apply(&engine.actor, payment.id, invoice.id, dec!(10.00))
            .await;
        assert_error_kind(&result, ErrorKind::Validation);
        assert!(engine.payments.applications(payment.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_invalid_reference() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let payment = engine.payment(&customer, dec!(10.00)).await;

        let result = engine
            .payments
            .apply(&engine.actor, payment.id, core_kernel::InvoiceId::new(), dec!(1.00))
            .await;
        assert_error_kind(&result, ErrorKind::InvalidReference);
    }

    #[tokio::test]
    async fn test_invoice_hard_delete_frees_payment_balance() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let invoice = engine.posted_invoice(&customer, dec!(80.00)).await;
        let payment = engine.payment(&customer, dec!(80.00)).await;
        engine
            .payments
            .apply(&engine.actor, payment.id, invoice.id, dec!(80.00))
            .await
            .unwrap();

        engine.invoices.hard_delete(&engine.actor, invoice.id).await.unwrap();

        assert!(engine.payments.applications(payment.id).await.unwrap().is_empty());
        assert_amount(&engine.payments.remaining_balance(payment.id).await.unwrap(), dec!(80.00));
    }
}

mod audit_envelope {
    use super::*;

    #[tokio::test]
    async fn test_soft_delete_restore_round_trip_keeps_business_fields() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let order = engine.standard_order(&customer).await;

        let deleted = engine.orders.soft_delete(&other_actor(), order.id).await.unwrap();
        assert_soft_deleted_by(&deleted, &other_actor());
        assert_last_modified_by(&deleted, &other_actor());

        let listed = engine.orders.list(Some(customer.id), ListQuery::default()).await.unwrap();
        assert!(listed.is_empty());
        let all = engine
            .orders
            .list(Some(customer.id), ListQuery::default().including_deleted())
            .await
            .unwrap();
        assert_eq!(all.len(), 1);

        let restored = engine.orders.restore(&engine.actor, order.id).await.unwrap();
        assert_not_deleted(&restored);
        assert_eq!(restored.lines, order.lines);
        assert_money_eq(&restored.total, &order.total);
        assert_eq!(restored.audit.created_by, order.audit.created_by);
    }

    #[tokio::test]
    async fn test_double_soft_delete_and_spurious_restore_rejected() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let payment = engine.payment(&customer, dec!(25.00)).await;

        let restore = engine.payments.restore(&engine.actor, payment.id).await;
        assert_error_kind(&restore, ErrorKind::InvariantViolation);

        engine.payments.soft_delete(&engine.actor, payment.id).await.unwrap();
        let again = engine.payments.soft_delete(&engine.actor, payment.id).await;
        assert_error_kind(&again, ErrorKind::InvariantViolation);
    }

    #[tokio::test]
    async fn test_deleted_payment_cannot_be_applied() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        let invoice = engine.posted_invoice(&customer, dec!(10.00)).await;
        let payment = engine.payment(&customer, dec!(10.00)).await;
        engine.payments.soft_delete(&engine.actor, payment.id).await.unwrap();

        let result = engine
            .payments
            .apply(&engine.actor, payment.id, invoice.id, dec!(10.00))
            .await;
        assert_error_kind(&result, ErrorKind::InvariantViolation);
    }

    #[tokio::test]
    async fn test_soft_deleted_customer_still_resolves_for_new_documents() {
        let engine = TestEngine::new();
        let customer = engine.customer().await;
        engine.customers.soft_delete(&engine.actor, customer.id).await.unwrap();

        let payment = engine.payment(&customer, dec!(5.00)).await;
        assert_eq!(payment.customer_id, customer.id);
        assert_eq!(payment.amount.currency(), Currency::USD);
    }
}

mod catalog_and_customers {
    use super::*;

    #[tokio::test]
    async fn test_fake_data_flows_through_services() {
        let engine = TestEngine::new();
        let customer = engine.customers.create(&engine.actor, fake_customer()).await.unwrap();
        let product = engine.products.create(&engine.actor, fake_product()).await.unwrap();

        let order = engine
            .orders
            .create(
                &engine.actor,
                OrderRequestBuilder::new(customer.id)
                    .with_line(
                        LineBuilder::for_product(product.id)
                            .with_unit_price(product.price)
                            .with_quantity(dec!(3))
                            .build(),
                    )
                    .build(),
            )
            .await
            .unwrap();

        assert_amount(&order.subtotal, product.price * Decimal::from(3));
        assert_totals_consistent(&order);
    }

    #[tokio::test]
    async fn test_customer_currency_drives_document_currency() {
        let engine = TestEngine::new();
        let customer = engine.customer_in(Currency::JPY).await;

        let invoice = engine
            .invoices
            .create(
                &engine.actor,
                InvoiceRequestBuilder::new(customer.id)
                    .with_line(LineBuilder::new().with_unit_price(dec!(1000.50)).build())
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(invoice.currency, Currency::JPY);
        assert_amount(&invoice.total, dec!(1001));
    }
}
