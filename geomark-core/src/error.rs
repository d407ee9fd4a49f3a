//! Unified error handling system
//!
//! Every domain failure carries an [`ErrorContext`] so the shell can show a
//! notification and the logs can correlate it by error id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type GeomarkResult<T> = Result<T, GeomarkError>;

/// Where an error happened and what the user can do about it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Correlates the shell notification with the log line
    pub error_id: String,
    pub timestamp: DateTime<Utc>,
    /// Module that raised the error, e.g. `marker_store`
    pub component: String,
    pub operation: Option<String>,
    pub metadata: HashMap<String, String>,
    /// Hints printed under the error message
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
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

/// Main error type for Geomark
#[derive(Error, Debug)]
pub enum GeomarkError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Invalid credentials: {message}")]
    InvalidCredentials {
        message: String,
        context: ErrorContext,
    },

    #[error("Index {index} is out of range for {len} markers")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        context: ErrorContext,
    },

    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Authentication required: {message}")]
    Authentication {
        message: String,
        context: ErrorContext,
    },

    #[error("Location unavailable: {message}")]
    Location {
        message: String,
        context: ErrorContext,
    },

    #[error("{operation} timed out after {duration_ms} ms")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
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

impl GeomarkError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GeomarkError::Validation { context, .. } => Some(context),
            GeomarkError::NotFound { context, .. } => Some(context),
            GeomarkError::InvalidCredentials { context, .. } => Some(context),
            GeomarkError::IndexOutOfRange { context, .. } => Some(context),
            GeomarkError::Persistence { context, .. } => Some(context),
            GeomarkError::Authentication { context, .. } => Some(context),
            GeomarkError::Location { context, .. } => Some(context),
            GeomarkError::Timeout { context, .. } => Some(context),
            GeomarkError::Config { context, .. } => Some(context),
            GeomarkError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether the user can fix this by changing their input
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            GeomarkError::Validation { .. }
                | GeomarkError::NotFound { .. }
                | GeomarkError::InvalidCredentials { .. }
                | GeomarkError::IndexOutOfRange { .. }
                | GeomarkError::Authentication { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            GeomarkError::Internal { .. } | GeomarkError::Persistence { .. } => {
                error!(error_id = ?error_id, error = %self, "Internal or storage error");
            }
            GeomarkError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            GeomarkError::Location { .. } | GeomarkError::Timeout { .. } => {
                warn!(error_id = ?error_id, error = %self, "Location request failed");
            }
            _ if self.is_user_error() => {
                warn!(error_id = ?error_id, error = %self, "Rejected user action");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }

    /// Recovery suggestions attached to the error, if any
    pub fn suggestions(&self) -> &[String] {
        self.context()
            .map(|c| c.recovery_suggestions.as_slice())
            .unwrap_or(&[])
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::GeomarkError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::GeomarkError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! persistence_error {
    ($msg:expr, $component:expr) => {
        $crate::GeomarkError::Persistence {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the data directory exists and is writable"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::GeomarkError::Persistence {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that the data directory exists and is writable"),
        }
    };
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GeomarkError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'geomark config --init' to create default config"),
        }
    };
}
