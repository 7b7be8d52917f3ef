//! Customer domain errors

use core_kernel::{CoreError, ErrorKind, PortError};
use thiserror::Error;

/// Errors that can occur in the customer domain
#[derive(Debug, Error)]
pub enum PartyError {
    /// Customer with the given ID was not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Customer data failed field validation
    #[error("Invalid customer data: {0}")]
    InvalidData(String),

    /// The customer's lifecycle forbids the operation (e.g. it is deleted)
    #[error("{0}")]
    InvariantViolation(String),

    /// The backing store failed
    #[error(transparent)]
    Port(#[from] PortError),
}

impl PartyError {
    /// Creates a CustomerNotFound error from any ID type
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        PartyError::CustomerNotFound(id.to_string())
    }

    /// Creates an InvalidData error with a message
    pub fn invalid(message: impl Into<String>) -> Self {
        PartyError::InvalidData(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PartyError::CustomerNotFound(_) => ErrorKind::NotFound,
            PartyError::InvalidData(_) => ErrorKind::Validation,
            PartyError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            PartyError::Port(e) => e.kind(),
        }
    }
}

impl From<CoreError> for PartyError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound(m) => PartyError::CustomerNotFound(m),
            CoreError::InvariantViolation(m) => PartyError::InvariantViolation(m),
            other => PartyError::InvalidData(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for PartyError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PartyError::InvalidData(errors.to_string())
    }
}
