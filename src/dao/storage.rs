use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by room store backends regardless of the underlying
/// database. Connectivity problems and per-operation failures are kept
/// apart so the supervisor can tell a dead backend from a bad document.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached at all.
    #[error("room store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend answered but the operation failed.
    #[error("room store operation failed: {message}")]
    Operation {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailability error from a backend connectivity failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct an operation error from a backend request failure.
    pub fn operation(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Operation {
            message,
            source: Box::new(source),
        }
    }
}
