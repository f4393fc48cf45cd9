//! Error Types
//!
//! Two error classes are kept strictly apart: call-level errors that are
//! returned as [`Error`] (precondition, configuration and catastrophic
//! failures), and per-element errors that are only ever delivered through a
//! batch error callback as a [`BatchElementError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for assetio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Call-level error taxonomy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Caller supplied an input that fails validation (unknown identifier,
    /// invalid entity reference string, absent trait, ...)
    #[error("Input validation error: {message}")]
    InputValidation { message: String },

    /// Deployment or setup problem (empty factory list, missing required
    /// capability, bad default manager config, ...)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Operation is not provided by the implementation
    #[error("Not implemented: {message}")]
    NotImplemented { message: String },

    /// Catastrophic, non-element-specific failure
    #[error("Unhandled error: {message}")]
    Unhandled { message: String },

    /// A per-element error promoted to a call-level error by a host
    /// convenience method
    #[error("Batch element error at index {index}: {error}")]
    BatchElement { index: usize, error: BatchElementError },
}

impl Error {
    /// Create an input validation error
    pub fn input_validation<S: Into<String>>(message: S) -> Self {
        Self::InputValidation { message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a not implemented error
    pub fn not_implemented<S: Into<String>>(message: S) -> Self {
        Self::NotImplemented { message: message.into() }
    }

    /// Create an unhandled error
    pub fn unhandled<S: Into<String>>(message: S) -> Self {
        Self::Unhandled { message: message.into() }
    }

    /// Wrap a batch element error with the index it occurred at
    pub fn batch_element(index: usize, error: BatchElementError) -> Self {
        Self::BatchElement { index, error }
    }

    /// Check if the error signals a programming or deployment problem
    /// rather than a runtime condition
    pub fn is_precondition_error(&self) -> bool {
        matches!(
            self,
            Error::InputValidation { .. } | Error::Configuration { .. } | Error::NotImplemented { .. }
        )
    }

    /// Check if error is a configuration issue
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::unhandled(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::configuration(format!("JSON error: {}", err))
    }
}

/// Per-element error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Unknown,
    InvalidEntityReference,
    MalformedEntityReference,
    EntityAccessError,
    EntityResolutionError,
    InvalidPreflightHint,
    InvalidTraitSet,
}

impl ErrorCode {
    /// Stable label used in diagnostics
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "unknown",
            ErrorCode::InvalidEntityReference => "invalidEntityReference",
            ErrorCode::MalformedEntityReference => "malformedEntityReference",
            ErrorCode::EntityAccessError => "entityAccessError",
            ErrorCode::EntityResolutionError => "entityResolutionError",
            ErrorCode::InvalidPreflightHint => "invalidPreflightHint",
            ErrorCode::InvalidTraitSet => "invalidTraitSet",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure of a single element of a batch call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchElementError {
    pub code: ErrorCode,
    pub message: String,
}

impl BatchElementError {
    pub fn new<S: Into<String>>(code: ErrorCode, message: S) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for BatchElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BatchElementError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::input_validation("Unknown manager 'x.foo'");
        assert_eq!(error.to_string(), "Input validation error: Unknown manager 'x.foo'");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::configuration("no factories").is_configuration_error());
        assert!(Error::configuration("no factories").is_precondition_error());
        assert!(Error::not_implemented("createState").is_precondition_error());
        assert!(!Error::unhandled("backend down").is_precondition_error());
    }

    #[test]
    fn test_batch_element_error_structural_equality() {
        let a = BatchElementError::new(ErrorCode::EntityResolutionError, "missing");
        let b = BatchElementError::new(ErrorCode::EntityResolutionError, "missing");
        let c = BatchElementError::new(ErrorCode::EntityAccessError, "missing");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_batch_element_wrapping() {
        let inner = BatchElementError::new(ErrorCode::InvalidTraitSet, "empty");
        let error = Error::batch_element(3, inner.clone());
        assert_eq!(error.to_string(), "Batch element error at index 3: invalidTraitSet: empty");
        assert!(matches!(error, Error::BatchElement { index: 3, error } if error == inner));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Unhandled { .. }));
        assert!(error.to_string().contains("IO error"));
    }
}
