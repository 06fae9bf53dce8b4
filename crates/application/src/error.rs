//! Application error types

use sea_domain::{AuthError, DomainError};
use thiserror::Error;

use crate::ports::StorageError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// An authentication or API call failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<StorageError> for AuthError {
    fn from(error: StorageError) -> Self {
        Self::Storage {
            message: error.to_string(),
        }
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
