//! Custom error types for entity-auditor
//!
//! This module defines the error hierarchy for the auditing pipeline using
//! thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for entity-auditor operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// An argument failed validation (empty username, nil batch id, ...)
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// A required object was not supplied
    #[error("Missing required value: {0}")]
    NullReference(&'static str),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Errors surfaced by a commit against the underlying store
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl AuditError {
    /// Create an invalid argument error
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Check if this error comes from argument validation
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. } | Self::NullReference(_))
    }

    /// Check if this is a persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for entity-auditor operations
pub type AuditResult<T> = Result<T, AuditError>;
