//! Catalog domain errors

use core_kernel::{CoreError, ErrorKind, PortError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Another product already uses the SKU
    #[error("SKU already exists: {0}")]
    DuplicateSku(String),

    #[error("Invalid product data: {0}")]
    InvalidData(String),

    #[error("{0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl CatalogError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        CatalogError::ProductNotFound(id.to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CatalogError::InvalidData(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::ProductNotFound(_) => ErrorKind::NotFound,
            CatalogError::DuplicateSku(_) | CatalogError::InvariantViolation(_) => {
                ErrorKind::InvariantViolation
            }
            CatalogError::InvalidData(_) => ErrorKind::Validation,
            CatalogError::Port(e) => e.kind(),
        }
    }
}

impl From<CoreError> for CatalogError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound(m) => CatalogError::ProductNotFound(m),
            CoreError::InvariantViolation(m) => CatalogError::InvariantViolation(m),
            other => CatalogError::InvalidData(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for CatalogError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CatalogError::InvalidData(errors.to_string())
    }
}
