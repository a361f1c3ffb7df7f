//! Custom error types for audit-trail
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.
//!
//! Most of these errors never reach a caller of the audit boundary: the
//! record store and the listener log and swallow them. They surface only
//! from repository, export and CLI operations.

use thiserror::Error;

/// The main error type for audit-trail operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for settings and inputs
    #[error("Validation error: {0}")]
    Validation(String),

    /// A field could not be read while converting or flattening a value
    #[error("Traversal error at '{path}': {reason}")]
    Traversal { path: String, reason: String },

    /// A change set could not be rendered into its persisted payload
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// The dispatcher queue is closed or full
    #[error("Dispatch error: {0}")]
    Dispatch(String),
}

impl AuditError {
    /// Create a traversal error for a field path
    pub fn traversal(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Traversal {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a "not found" error for audit records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "AuditRecord",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a traversal error
    pub fn is_traversal(&self) -> bool {
        matches!(self, Self::Traversal { .. })
    }
}

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

/// Result type alias for audit-trail operations
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuditError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = AuditError::record_not_found("aud-1234abcd");
        assert_eq!(err.to_string(), "AuditRecord not found: aud-1234abcd");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_traversal_error() {
        let err = AuditError::traversal("address.city", "field not readable");
        assert_eq!(
            err.to_string(),
            "Traversal error at 'address.city': field not readable"
        );
        assert!(err.is_traversal());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let audit_err: AuditError = io_err.into();
        assert!(matches!(audit_err, AuditError::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let audit_err: AuditError = json_err.into();
        assert!(matches!(audit_err, AuditError::Json(_)));
    }
}
