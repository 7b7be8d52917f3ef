//! API error handling
//!
//! Domain errors are classified by [`ErrorKind`] and mapped to a status code
//! and a `{error, message}` JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::ErrorKind;
use domain_billing::BillingError;
use domain_catalog::CatalogError;
use domain_party::PartyError;
use domain_sales::SalesError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    /// Classifies a domain failure by its kind
    pub fn from_kind(kind: ErrorKind, message: String) -> Self {
        match kind {
            ErrorKind::NotFound => ApiError::NotFound(message),
            ErrorKind::InvalidReference => ApiError::BadRequest(message),
            ErrorKind::Validation => ApiError::Validation(message),
            ErrorKind::InvariantViolation => ApiError::Conflict(message),
            ErrorKind::Store => ApiError::Internal(message),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (error_type, message) = match &self {
            ApiError::NotFound(msg) => ("not_found", msg.clone()),
            ApiError::BadRequest(msg) => ("invalid_reference", msg.clone()),
            ApiError::Unauthorized => ("unauthorized", "Unauthorized".to_string()),
            ApiError::Conflict(msg) => ("invariant_violation", msg.clone()),
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                ("store_error", msg.clone())
            }
            ApiError::Validation(msg) => ("validation_error", msg.clone()),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (self.status(), Json(body)).into_response()
    }
}

macro_rules! from_domain_error {
    ($($error:ty),+) => {
        $(
            impl From<$error> for ApiError {
                fn from(err: $error) -> Self {
                    ApiError::from_kind(err.kind(), err.to_string())
                }
            }
        )+
    };
}

from_domain_error!(PartyError, CatalogError, SalesError, BillingError);

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}
