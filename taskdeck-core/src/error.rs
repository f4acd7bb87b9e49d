//! Unified error handling system
//!
//! Provides structured error types with context, recovery suggestions, and proper error chaining

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

pub type TaskdeckResult<T> = Result<T, TaskdeckError>;

/// Message used by every disabled mutation
pub const DISABLED_FEATURE_MESSAGE: &str = "This feature is currently disabled";

/// Error context providing additional information for debugging and recovery
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
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: std::collections::HashMap::new(),
            recovery_suggestions: Vec::new(),
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

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Taskdeck system
#[derive(Error, Debug)]
pub enum TaskdeckError {
    /// Local input check failed; nothing was sent to the server
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    /// The identity endpoint rejected the credentials or the registration
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    /// The resource API rejected the presented bearer token. The session has
    /// already been torn down by the time a caller sees this.
    #[error("Session expired: authorization was rejected by the server")]
    AuthorizationExpired { context: ErrorContext },

    #[error("{operation}: This feature is currently disabled")]
    OperationDisabled {
        operation: String,
        context: ErrorContext,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    /// Non-success HTTP status other than 401
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
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

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },
}

impl TaskdeckError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            TaskdeckError::Validation { context, .. } => Some(context),
            TaskdeckError::Authentication { context, .. } => Some(context),
            TaskdeckError::AuthorizationExpired { context } => Some(context),
            TaskdeckError::OperationDisabled { context, .. } => Some(context),
            TaskdeckError::Network { context, .. } => Some(context),
            TaskdeckError::Api { context, .. } => Some(context),
            TaskdeckError::Storage { context, .. } => Some(context),
            TaskdeckError::Config { context, .. } => Some(context),
            TaskdeckError::NotFound { context, .. } => Some(context),
            TaskdeckError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Create an authorization-expired error for the given operation
    pub fn authorization_expired(component: &str, operation: &str) -> Self {
        TaskdeckError::AuthorizationExpired {
            context: ErrorContext::new(component)
                .with_operation(operation)
                .with_suggestion("Log in again to start a new session"),
        }
    }

    /// Check if error is recoverable, i.e. the caller should offer a retry
    pub fn is_recoverable(&self) -> bool {
        match self {
            TaskdeckError::Network { .. } => true,
            TaskdeckError::Api { status, .. } => *status >= 500 || *status == 429,
            TaskdeckError::Validation { .. } => false,
            TaskdeckError::Authentication { .. } => false,
            TaskdeckError::AuthorizationExpired { .. } => false,
            TaskdeckError::OperationDisabled { .. } => false,
            TaskdeckError::Config { .. } => false,
            TaskdeckError::NotFound { .. } => false,
            _ => false,
        }
    }

    /// Whether this error means the session has ended and a fresh login is required
    pub fn is_session_ending(&self) -> bool {
        matches!(self, TaskdeckError::AuthorizationExpired { .. })
    }

    /// Whether this error was produced locally without any network I/O
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            TaskdeckError::Validation { .. }
                | TaskdeckError::OperationDisabled { .. }
                | TaskdeckError::Config { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            TaskdeckError::Internal { .. } | TaskdeckError::Storage { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Internal error occurred"
                );
            }
            TaskdeckError::Config { .. } | TaskdeckError::Validation { .. } => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Configuration or validation error"
                );
            }
            TaskdeckError::Network { .. } | TaskdeckError::Api { .. } => {
                warn!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Network or API error (may be recoverable)"
                );
            }
            TaskdeckError::AuthorizationExpired { .. } | TaskdeckError::OperationDisabled { .. } => {
                info!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Request rejected"
                );
            }
            _ => {
                error!(
                    error_id = ?self.context().map(|c| &c.error_id),
                    error = %self,
                    "Error occurred"
                );
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::TaskdeckError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'taskdeck config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::TaskdeckError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! disabled_error {
    ($operation:expr, $component:expr) => {
        $crate::TaskdeckError::OperationDisabled {
            operation: $operation.to_string(),
            context: $crate::ErrorContext::new($component).with_operation($operation),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::TaskdeckError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the resource identifier")
                .with_suggestion("Check if the resource exists and is accessible"),
        }
    };
}
