//! Error types for Loam
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Storage-layer failures (conflict, permission, unavailable, quota) pass
//! through as `Backend` unmodified: this layer adds no retry, no backoff,
//! no reclassification.

use thiserror::Error;

/// Result type alias for Loam operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the document-store adapter
#[derive(Debug, Error)]
pub enum Error {
    /// Document not found (raised only by the `*_or_fail` read variants;
    /// every other read path returns `None` instead)
    #[error("not found: {0}")]
    NotFound(String),

    /// Instance-level write or delete attempted without a persisted id
    /// or without `exists` set
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A `Create` write targeted a document that already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// An `Update` write targeted a document that does not exist
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// A transaction replay was aborted; nothing was committed
    #[error("transaction aborted: {0}")]
    Aborted(String),

    /// Malformed input: empty path segment, unknown operator, bad cursor
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Error surfaced by the underlying datastore client, passed through
    /// unmodified
    #[error("backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Shorthand for a `NotFound` error
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Shorthand for an `InvalidState` error
    pub fn invalid_state(what: impl Into<String>) -> Self {
        Error::InvalidState(what.into())
    }

    /// Shorthand for an `InvalidArgument` error
    pub fn invalid_argument(what: impl Into<String>) -> Self {
        Error::InvalidArgument(what.into())
    }

    /// Shorthand for a `Backend` error
    pub fn backend(what: impl Into<String>) -> Self {
        Error::Backend(what.into())
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True for `InvalidState`
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }

    /// True for `PreconditionFailed`
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, Error::PreconditionFailed(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
