//! Error types for bulkops
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! | Category | Variants | Surfaced as |
//! |----------|----------|-------------|
//! | Not Found | `CollectionNotFound`, `OperationNotFound` | synchronous error to the caller |
//! | Store failure | `ConstraintViolation`, `Storage` | terminal `failed` operation |
//! | Status store | `StatusStoreUnavailable` | logged, never an operation failure |
//! | Input | `InvalidInput`, `InvalidConfig`, `Serialization` | synchronous error |
//! | Capacity | `Overloaded` | synchronous error, operation marked `failed` |

use crate::types::CollectionId;
use thiserror::Error;

/// Result type alias for bulkops operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bulkops
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Referenced collection does not exist
    #[error("collection not found: {collection}")]
    CollectionNotFound {
        /// The missing collection
        collection: CollectionId,
    },

    /// Operation id is unknown, expired, or unreadable
    #[error("operation not found: {operation}")]
    OperationNotFound {
        /// The id as supplied by the caller
        operation: String,
    },

    /// Store rejected a write (duplicate key, foreign key)
    #[error("constraint violation: {reason}")]
    ConstraintViolation {
        /// Store-provided message
        reason: String,
    },

    /// Any other store failure (connectivity, timeout, aborted commit)
    #[error("storage error: {reason}")]
    Storage {
        /// Store-provided message
        reason: String,
    },

    /// Status store could not be read or written
    #[error("status store unavailable: {reason}")]
    StatusStoreUnavailable {
        /// Connection or protocol message
        reason: String,
    },

    /// Encoding or decoding a status record failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Malformed request
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong
        reason: String,
    },

    /// Malformed configuration
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// What was wrong
        reason: String,
    },

    /// Background queue is full or shut down
    #[error("overloaded: {reason}")]
    Overloaded {
        /// Why the submission was refused
        reason: String,
    },
}

impl Error {
    /// Shorthand for [`Error::Storage`]
    pub fn storage(reason: impl Into<String>) -> Self {
        Error::Storage {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::ConstraintViolation`]
    pub fn constraint(reason: impl Into<String>) -> Self {
        Error::ConstraintViolation {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::InvalidInput`]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::InvalidConfig`]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// True for the not-found family
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::CollectionNotFound { .. } | Error::OperationNotFound { .. }
        )
    }

    /// True for errors raised by the relational store during a batch
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Error::ConstraintViolation { .. } | Error::Storage { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
