//! # File Storage Errors
//!
//! Every backend failure collapses into one of three outcomes. The HTTP layer
//! picks a status from the variant alone and never sees backend error types.

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No record stored under the requested hash
    #[error("File not found: {0}")]
    NotFound(String),

    /// A record with this hash is already stored
    #[error("File already exists: {0}")]
    Conflict(String),

    /// The storage medium failed (I/O, corruption, closed store)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::NotFound(_) => 404,
            StorageError::Conflict(_) => 409,
            StorageError::Internal(_) => 500,
        }
    }

    /// Short label for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "not_found",
            StorageError::Conflict(_) => "conflict",
            StorageError::Internal(_) => "internal",
        }
    }

    pub fn not_found(hash: &str) -> Self {
        StorageError::NotFound(hash.to_string())
    }

    pub fn conflict(hash: &str) -> Self {
        StorageError::Conflict(hash.to_string())
    }

    /// Log the underlying failure and return an `Internal` error whose
    /// message carries no backend detail.
    pub fn internal(op: &'static str, hash: &str, cause: impl std::fmt::Display) -> Self {
        tracing::error!(op, hash, error = %cause, "storage medium failure");
        StorageError::Internal("internal storage error".to_string())
    }
}
