//! Unified error handling system
//!
//! Provides structured error types with context and proper error chaining.
//! Every public operation in the access services returns a tagged
//! `PinegateResult` instead of raising past its own boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type PinegateResult<T> = Result<T, PinegateError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: std::collections::HashMap<String, String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Main error type for the Pinegate system
#[derive(Error, Debug)]
pub enum PinegateError {
    /// Login could not establish usable credentials. Surfaced as degraded
    /// session state rather than an immediate fault.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    /// The remote platform rejected an authenticated call as
    /// unauthenticated. Triggers re-login on the probe path only.
    #[error("Authorization error: {message}")]
    Authorization {
        message: String,
        context: ErrorContext,
    },

    /// Network error or unexpected status from any data call against the
    /// remote platform.
    #[error("Remote service error: {message}")]
    RemoteService {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Caller input rejected before any remote call, e.g. an extension
    /// directive with an unrecognized unit.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PinegateError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            PinegateError::Authentication { context, .. } => Some(context),
            PinegateError::Authorization { context, .. } => Some(context),
            PinegateError::RemoteService { context, .. } => Some(context),
            PinegateError::Config { context, .. } => Some(context),
            PinegateError::Validation { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Check if error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        match self {
            PinegateError::RemoteService { .. } => true,
            PinegateError::Authorization { .. } => true,
            PinegateError::Authentication { .. } => false,
            PinegateError::Config { .. } => false,
            PinegateError::Validation { .. } => false,
            _ => false,
        }
    }

    /// Log the error, recoverable ones at warn level
    pub fn log(&self) {
        if self.is_recoverable() {
            warn!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Recoverable error occurred"
            );
        } else {
            error!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Error occurred"
            );
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! remote_error {
    ($msg:expr, $component:expr) => {
        $crate::PinegateError::RemoteService {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::PinegateError::RemoteService {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::PinegateError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_builder() {
        let ctx = ErrorContext::new("session")
            .with_operation("login")
            .with_metadata("endpoint", "signin");
        assert_eq!(ctx.component, "session");
        assert_eq!(ctx.operation.as_deref(), Some("login"));
        assert_eq!(ctx.metadata.get("endpoint").map(String::as_str), Some("signin"));
    }

    #[test]
    fn test_recoverability_classification() {
        let remote = remote_error!("boom", "query");
        assert!(remote.is_recoverable());

        let authorization = PinegateError::Authorization {
            message: "rejected".to_string(),
            context: ErrorContext::new("query"),
        };
        assert!(authorization.is_recoverable());

        let validation = validation_error!("bad unit", "duration", "directive");
        assert!(!validation.is_recoverable());
    }
}
