//! Error types for the nightshift operator
//!
//! Errors are structured with fields to aid debugging in production. Each
//! variant carries the context a reconciler needs to decide whether the
//! failure is worth retrying.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for nightshift operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Validation error for CRD specs
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.schedules[0].startTime")
        field: Option<String>,
    },

    /// Scaling operation error for a target namespace
    #[error("scaling error for namespace {namespace}: {message}")]
    Scaling {
        /// Namespace the engine was acting on
        namespace: String,
        /// Description of what failed
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "reconciler", "executor")
        context: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with a field path
    pub fn validation_for_field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a scaling error for the given namespace
    pub fn scaling(namespace: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Scaling {
            namespace: namespace.into(),
            message: msg.into(),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Validation errors are not retryable (require a spec fix). Kubernetes
    /// errors depend on the status code: 4xx responses (not found, conflict
    /// excepted) will not get better on their own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => match source {
                // Conflicts resolve on the next read-modify-write cycle
                kube::Error::Api(ae) if ae.code == 409 => true,
                kube::Error::Api(ae) if (400..500).contains(&ae.code) => false,
                _ => true,
            },
            Error::Validation { .. } => false,
            Error::Scaling { .. } => true,
            Error::Internal { .. } => true,
        }
    }

    /// Get the namespace if this error is associated with one
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Error::Scaling { namespace, .. } => Some(namespace),
            _ => None,
        }
    }
}
