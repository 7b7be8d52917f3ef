//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful failure
//! messages than bare `assert_eq!`.

use std::fmt::Debug;

use rust_decimal::Decimal;

use core_kernel::{Actor, Auditable, ErrorKind, Money, SoftDeletable};
use domain_billing::{BillingError, Invoice};
use domain_catalog::CatalogError;
use domain_party::PartyError;
use domain_sales::{Order, SalesError};

/// Errors that reduce to an [`ErrorKind`]
pub trait ClassifiedError: Debug {
    fn error_kind(&self) -> ErrorKind;
}

macro_rules! classified {
    ($($error:ty),+ $(,)?) => {
        $(
            impl ClassifiedError for $error {
                fn error_kind(&self) -> ErrorKind {
                    self.kind()
                }
            }
        )+
    };
}

classified!(PartyError, CatalogError, SalesError, BillingError);

/// Asserts that a result failed with the given kind
///
/// # Panics
///
/// Panics if the result is `Ok` or the error has a different kind
pub fn assert_error_kind<T: Debug, E: ClassifiedError>(result: &Result<T, E>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected {expected} error, got Ok({value:?})"),
        Err(e) => assert_eq!(
            e.error_kind(),
            expected,
            "Expected {expected} error, got {:?}: {e:?}",
            e.error_kind()
        ),
    }
}

/// Asserts amount and currency match exactly
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual.amount(),
        expected.amount()
    );
}

/// Asserts a Money amount without restating the currency
pub fn assert_amount(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Expected {} {}, got {}",
        actual.currency().symbol(),
        expected,
        actual
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// A priced document: orders and invoices
pub trait PricedDocument {
    fn subtotal(&self) -> Money;
    fn tax_total(&self) -> Money;
    fn total(&self) -> Money;
    fn line_count(&self) -> usize;
}

impl PricedDocument for Order {
    fn subtotal(&self) -> Money {
        self.subtotal
    }
    fn tax_total(&self) -> Money {
        self.tax_total
    }
    fn total(&self) -> Money {
        self.total
    }
    fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl PricedDocument for Invoice {
    fn subtotal(&self) -> Money {
        self.subtotal
    }
    fn tax_total(&self) -> Money {
        self.tax_total
    }
    fn total(&self) -> Money {
        self.total
    }
    fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Asserts `total == subtotal + tax_total` and that all three share a currency
pub fn assert_totals_consistent<D: PricedDocument>(document: &D) {
    let (subtotal, tax_total, total) =
        (document.subtotal(), document.tax_total(), document.total());
    assert!(
        subtotal.same_currency(&tax_total) && subtotal.same_currency(&total),
        "Totals mix currencies: subtotal={subtotal}, tax_total={tax_total}, total={total}"
    );
    assert_eq!(
        total.amount(),
        subtotal.amount() + tax_total.amount(),
        "total {total} != subtotal {subtotal} + tax_total {tax_total}"
    );
}

/// Asserts the three document totals
pub fn assert_totals<D: PricedDocument>(
    document: &D,
    subtotal: Decimal,
    tax_total: Decimal,
    total: Decimal,
) {
    assert_amount(&document.subtotal(), subtotal);
    assert_amount(&document.tax_total(), tax_total);
    assert_amount(&document.total(), total);
    assert_totals_consistent(document);
}

/// Asserts the record is soft-deleted by `actor`
pub fn assert_soft_deleted_by<T: SoftDeletable>(record: &T, actor: &Actor) {
    let deletion = record.deletion();
    assert!(deletion.is_deleted, "Expected {} to be soft-deleted", T::ENTITY);
    assert!(deletion.deleted_at.is_some(), "{} has no deleted_at", T::ENTITY);
    assert_eq!(deletion.deleted_by, Some(actor.user_id), "{} deleted_by mismatch", T::ENTITY);
}

/// Asserts the record carries no deletion marker
pub fn assert_not_deleted<T: SoftDeletable>(record: &T) {
    let deletion = record.deletion();
    assert!(!deletion.is_deleted, "Expected {} not to be deleted", T::ENTITY);
    assert!(deletion.deleted_at.is_none() && deletion.deleted_by.is_none());
}

/// Asserts who last modified the record and that the stamps are ordered
pub fn assert_last_modified_by<T: Auditable>(record: &T, actor: &Actor) {
    let audit = record.audit();
    assert_eq!(audit.last_modified_by, actor.user_id, "last_modified_by mismatch");
    assert!(
        audit.updated_at >= audit.created_at,
        "updated_at {} precedes created_at {}",
        audit.updated_at,
        audit.created_at
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_assert_error_kind_accepts_matching_kind() {
        let result: Result<(), SalesError> = Err(SalesError::invariant("closed"));
        assert_error_kind(&result, ErrorKind::InvariantViolation);
    }

    #[test]
    #[should_panic(expected = "Expected not_found error")]
    fn test_assert_error_kind_rejects_ok() {
        let result: Result<u8, BillingError> = Ok(1);
        assert_error_kind(&result, ErrorKind::NotFound);
    }

    #[test]
    #[should_panic(expected = "Currency mismatch")]
    fn test_assert_money_eq_checks_currency() {
        assert_money_eq(
            &Money::new(dec!(1.00), Currency::USD),
            &Money::new(dec!(1.00), Currency::EUR),
        );
    }
}
