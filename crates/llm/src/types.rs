//! LLM Client Types
//!
//! Error taxonomy and request options shared by all backend clients.
//! The error enum is serializable so callers can surface it over any
//! transport without re-wrapping.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when talking to a generation or embedding backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// The backend is not reachable or not running.
    ProviderUnavailable { message: String },

    /// The requested model was not found or is not available.
    ModelNotFound { model: String },

    /// A network or connection error occurred.
    NetworkError { message: String },

    /// The backend returned an unexpected or unparseable response.
    ParseError { message: String },

    /// The backend returned an HTTP error.
    ServerError {
        message: String,
        status: Option<u16>,
    },

    /// Rate limit exceeded.
    RateLimited { message: String },

    /// The request was rejected as malformed.
    InvalidRequest { message: String },

    /// Client configuration is invalid or incomplete.
    InvalidConfig { message: String },

    /// Any other error.
    Other { message: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProviderUnavailable { message } => {
                write!(f, "provider unavailable: {}", message)
            }
            Self::ModelNotFound { model } => write!(f, "model not found: {}", model),
            Self::NetworkError { message } => write!(f, "network error: {}", message),
            Self::ParseError { message } => write!(f, "parse error: {}", message),
            Self::ServerError { message, status } => {
                if let Some(code) = status {
                    write!(f, "server error (HTTP {}): {}", code, message)
                } else {
                    write!(f, "server error: {}", message)
                }
            }
            Self::RateLimited { message } => write!(f, "rate limited: {}", message),
            Self::InvalidRequest { message } => write!(f, "invalid request: {}", message),
            Self::InvalidConfig { message } => write!(f, "invalid config: {}", message),
            Self::Other { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Whether this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::NetworkError { .. }
                | LlmError::RateLimited { .. }
                | LlmError::ServerError { .. }
                | LlmError::ProviderUnavailable { .. }
        )
    }
}

/// Convenience alias for LLM operation results.
pub type LlmResult<T> = Result<T, LlmError>;

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

/// Per-call options for generation requests.
///
/// `None` fields fall back to the provider's configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model override for this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens to generate for this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

impl GenerationOptions {
    /// Options tuned for deterministic, short classification replies.
    pub fn deterministic(max_tokens: u32) -> Self {
        Self {
            model: None,
            temperature: 0.1,
            max_tokens: Some(max_tokens),
        }
    }
}
