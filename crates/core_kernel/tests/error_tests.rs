//! Tests for core_kernel error types

use core_kernel::error::{CoreError, ErrorKind};
use core_kernel::money::MoneyError;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("quantity must be greater than zero");

    match &error {
        CoreError::Validation(msg) => assert!(msg.contains("quantity")),
        _ => panic!("Expected Validation error"),
    }
    assert_eq!(error.kind(), ErrorKind::Validation);
}

#[test]
fn test_core_error_invariant() {
    let error = CoreError::invariant("Order already closed");

    assert!(matches!(error, CoreError::InvariantViolation(_)));
    assert_eq!(error.kind(), ErrorKind::InvariantViolation);
    assert!(error.to_string().contains("Order already closed"));
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Invoice INV-1");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn test_core_error_from_money_error_is_validation() {
    let money_error = MoneyError::CurrencyMismatch("USD".to_string(), "EUR".to_string());
    let core_error: CoreError = money_error.into();

    assert!(matches!(core_error, CoreError::Money(_)));
    assert_eq!(core_error.kind(), ErrorKind::Validation);
}

#[test]
fn test_error_kind_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorKind::InvalidReference).unwrap();
    assert_eq!(json, "\"invalid_reference\"");
    assert_eq!(ErrorKind::InvariantViolation.to_string(), "invariant_violation");
}
