//! Sales domain errors

use core_kernel::{CoreError, ErrorKind, MoneyError, PortError};
use thiserror::Error;

/// Errors raised by the line computer and the order lifecycle
#[derive(Debug, Error)]
pub enum SalesError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// A customer or product id in the request does not resolve
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Closed or deleted orders, invalid transitions
    #[error("{0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl SalesError {
    pub fn validation(message: impl Into<String>) -> Self {
        SalesError::Validation(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        SalesError::InvariantViolation(message.into())
    }

    pub fn invalid_reference(entity: &str, id: impl std::fmt::Display) -> Self {
        SalesError::InvalidReference(format!("{entity} {id} does not exist"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SalesError::OrderNotFound(_) => ErrorKind::NotFound,
            SalesError::InvalidReference(_) => ErrorKind::InvalidReference,
            SalesError::Validation(_) => ErrorKind::Validation,
            SalesError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            SalesError::Port(e) => e.kind(),
        }
    }
}

impl From<CoreError> for SalesError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound(m) => SalesError::OrderNotFound(m),
            CoreError::InvariantViolation(m) => SalesError::InvariantViolation(m),
            other => SalesError::Validation(other.to_string()),
        }
    }
}

impl From<MoneyError> for SalesError {
    fn from(error: MoneyError) -> Self {
        SalesError::Validation(error.to_string())
    }
}
