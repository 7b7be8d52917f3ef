//! Core error types used across the system

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use crate::money::MoneyError;

/// Classification every domain error reduces to
///
/// Callers (the HTTP layer in particular) branch on the kind rather than on
/// each crate's concrete error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The addressed entity does not exist
    NotFound,
    /// An id supplied inside the request points at nothing
    InvalidReference,
    /// The operation would break a state-machine or balance rule
    InvariantViolation,
    /// Malformed input: bad quantity, negative price, missing line source
    Validation,
    /// A collaborator (store, lookup) failed
    Store,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidReference => "invalid_reference",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::Validation => "validation",
            ErrorKind::Store => "store",
        };
        f.write_str(label)
    }
}

/// Core error type for the kernel
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CoreError::InvariantViolation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        CoreError::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Money(_) | CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            CoreError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}
