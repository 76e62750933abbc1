//! Domain error types

use thiserror::Error;

/// Errors raised when parsing domain values from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A monitor schedule string is not one of the known intervals.
    #[error("unknown monitor schedule: {0}")]
    UnknownSchedule(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
