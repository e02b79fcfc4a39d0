//! Error types for labbook
//!
//! Every failure surfaces to the caller immediately; nothing is retried or
//! replaced with a default.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Labbook error types
#[derive(Error, Debug)]
pub enum Error {
    /// Identifier, artifact, or summary-bearing artifact is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation is not available on this backend
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Malformed tagged value or malformed event-log record
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Document store, blob store, or backend configuration failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for [`Error::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for [`Error::UnsupportedOperation`].
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedOperation(_))
    }

    /// True for [`Error::DecodeError`].
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::DecodeError(_))
    }
}
