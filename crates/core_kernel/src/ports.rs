//! Ports and Adapters Infrastructure
//!
//! Domain crates declare port traits (for the guest registry, the
//! `GuestStorePort`) in terms of the types below, and each adapter maps its
//! own failures onto [`PortError`]. Workflows therefore never see SQLx or any
//! other backend type.
//!
//! ```text
//!   GuestService ──► GuestStorePort ◄── PostgresGuestStore (infra_db)
//!                                   ◄── InMemoryGuestStore (domain_guest)
//! ```
//!
//! Every port call carries an optional [`OperationMetadata`] so adapters can
//! tag their logs with the workflow step that caused the call.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a port adapter
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested record does not exist
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The backend refused the data (check or foreign key constraint)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The write collides with stored data, e.g. a document number
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The backend could not be reached; retrying may succeed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// A stored record could not be mapped to a domain value
    #[error("Transformation error: {message}")]
    Transformation { message: String },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker trait for all domain ports
///
/// Ports are shared as `Arc<dyn Port>` across tasks.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    /// Serving reads, but writes are failing
    Degraded,
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    /// Returns true when the adapter can serve requests
    pub fn is_operational(&self) -> bool {
        matches!(self.status, AdapterHealth::Healthy | AdapterHealth::Degraded)
    }
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

/// Context of a port call, for logging and tracing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationMetadata {
    /// Workflow step that issued the call, e.g. `register_companion`
    pub operation: Option<String>,
    /// Correlation ID propagated from the caller (HTTP request id)
    pub correlation_id: Option<String>,
    /// Component or user that initiated the call
    pub initiated_by: Option<String>,
}

impl OperationMetadata {
    /// Creates metadata for a named workflow step
    pub fn for_operation(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn initiated_by(mut self, initiator: impl Into<String>) -> Self {
        self.initiated_by = Some(initiator.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let error = PortError::not_found("Guest", "GST-123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "Not found: Guest with id GST-123");
    }

    #[test]
    fn test_only_connection_errors_are_transient() {
        assert!(PortError::connection("refused").is_transient());
        assert!(!PortError::conflict("duplicate document").is_transient());
        assert!(!PortError::internal("bug").is_transient());
        assert!(PortError::conflict("duplicate document").is_conflict());
    }

    #[test]
    fn test_degraded_is_operational() {
        let mut result = HealthCheckResult {
            adapter_id: "test".to_string(),
            status: AdapterHealth::Degraded,
            latency_ms: 0,
            message: None,
            checked_at: chrono::Utc::now(),
        };
        assert!(result.is_operational());
        result.status = AdapterHealth::Unhealthy;
        assert!(!result.is_operational());
    }

    #[test]
    fn test_operation_metadata_builder() {
        let metadata = OperationMetadata::for_operation("register_primary")
            .with_correlation_id("req-123")
            .initiated_by("front-desk");

        assert_eq!(metadata.operation.as_deref(), Some("register_primary"));
        assert_eq!(metadata.correlation_id.as_deref(), Some("req-123"));
        assert_eq!(metadata.initiated_by.as_deref(), Some("front-desk"));
    }
}
