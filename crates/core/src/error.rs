//! Core Error Types
//!
//! Foundational error types shared across the Switchboard workspace. These
//! are dependency-light (thiserror + std) so that every crate can use them
//! without pulling in backend clients.
//!
//! Backend-specific failures live next to their clients (`LlmError` in the
//! llm crate, `StoreError` in the rag crate); this type covers validation,
//! configuration, and serialization concerns.

use thiserror::Error;

/// Core error type for the Switchboard workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors (bad values, failed layered loading)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors (missing or malformed caller input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
