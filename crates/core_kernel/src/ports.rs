//! Ports and Adapters Infrastructure
//!
//! Foundational types for the hexagonal layout used by every domain crate.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Services                      │
//! │   (OrderService, InvoiceService, PaymentService, ...)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Port Traits                           │
//! │  CustomerPort, ProductPort, OrderPort, InvoicePort,          │
//! │  PaymentPort: defined per domain, depend only on this crate  │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!          ┌─────────┴─────────┐     ┌────────┴────────┐
//!          │  Postgres adapter │     │ In-memory mock  │
//!          │    (infra_db)     │     │ (feature "mock")│
//!          └───────────────────┘     └─────────────────┘
//! ```
//!
//! Adapters report failures through [`PortError`]; each domain error enum
//! converts from it and reduces it to an [`ErrorKind`].

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;

/// Error type for port operations
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The store rejected the data as malformed
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The write lost a race or collides with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }

    /// Reduces the adapter failure to the shared error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortError::NotFound { .. } => ErrorKind::NotFound,
            PortError::Validation { .. } => ErrorKind::Validation,
            PortError::Conflict { .. } => ErrorKind::InvariantViolation,
            PortError::Connection { .. } | PortError::Internal { .. } => ErrorKind::Store,
        }
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker so they are thread-safe and usable
/// behind `Arc<dyn ...>` in async services.
pub trait DomainPort: Send + Sync + 'static {}

/// Pagination and visibility options shared by every list operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Include soft-deleted rows
    pub include_deleted: bool,
    pub limit: u32,
    pub offset: u32,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 200;

    /// Builds a query, clamping the page size to `1..=MAX_LIMIT`
    pub fn new(limit: Option<u32>, offset: Option<u32>, include_deleted: bool) -> Self {
        Self {
            include_deleted,
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }

    pub fn including_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Applies visibility and paging to an already ordered sequence
    pub fn page<T, I, F>(&self, items: I, is_deleted: F) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> bool,
    {
        items
            .into_iter()
            .filter(|item| self.include_deleted || !is_deleted(item))
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(None, None, false)
    }
}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: chrono::Utc::now(),
        }
    }

    pub fn unhealthy(
        adapter_id: impl Into<String>,
        latency_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: chrono::Utc::now(),
        }
    }
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}
