//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A progress value is outside the 0-100 range.
    #[error("invalid progress: {0} (expected 0-100)")]
    InvalidProgress(u8),

    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Login credentials are incomplete.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
