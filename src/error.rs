//! Error types for handler-collection.

use thiserror::Error;

/// Main error type for all collection operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// The constraint identifier does not resolve to a registered
    /// contract or handler type.
    #[error("unknown handler constraint \"{0}\"")]
    InvalidConstraint(String),

    /// A handler does not satisfy the collection's constraint.
    #[error("handler does not satisfy constraint \"{constraint}\"")]
    InvalidHandler {
        /// Name of the constraint the handler failed.
        constraint: String,
    },
}

/// Result type alias using CollectionError.
pub type Result<T> = std::result::Result<T, CollectionError>;
