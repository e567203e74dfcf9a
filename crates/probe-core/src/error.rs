//! Core error types.

use thiserror::Error;

/// Errors raised by core type construction.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A class or type name is not a well-formed dotted name.
    #[error("invalid class name '{name}': {reason}")]
    InvalidClassName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
