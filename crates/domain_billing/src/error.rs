//! Billing domain errors

use core_kernel::{CoreError, ErrorKind, MoneyError, PortError};
use domain_sales::SalesError;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// A customer, order, invoice or product id in the request does not resolve
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Lifecycle or balance rule violated
    #[error("{0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        BillingError::InvariantViolation(message.into())
    }

    pub fn invalid_reference(entity: &str, id: impl std::fmt::Display) -> Self {
        BillingError::InvalidReference(format!("{entity} {id} does not exist"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::InvoiceNotFound(_) | BillingError::PaymentNotFound(_) => {
                ErrorKind::NotFound
            }
            BillingError::InvalidReference(_) => ErrorKind::InvalidReference,
            BillingError::Validation(_) => ErrorKind::Validation,
            BillingError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            BillingError::Port(e) => e.kind(),
        }
    }
}

impl From<SalesError> for BillingError {
    fn from(error: SalesError) -> Self {
        match error {
            SalesError::OrderNotFound(m) | SalesError::InvalidReference(m) => {
                BillingError::InvalidReference(m)
            }
            SalesError::Validation(m) => BillingError::Validation(m),
            SalesError::InvariantViolation(m) => BillingError::InvariantViolation(m),
            SalesError::Port(e) => BillingError::Port(e),
        }
    }
}

impl From<CoreError> for BillingError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvariantViolation(m) => BillingError::InvariantViolation(m),
            CoreError::NotFound(m) => BillingError::InvalidReference(m),
            other => BillingError::Validation(other.to_string()),
        }
    }
}

impl From<MoneyError> for BillingError {
    fn from(error: MoneyError) -> Self {
        BillingError::Validation(error.to_string())
    }
}
