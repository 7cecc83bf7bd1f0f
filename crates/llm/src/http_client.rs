//! HTTP Client Factory
//!
//! Builds the shared reqwest client for a backend. Clients are constructed
//! once per provider and reused for the lifetime of the process; reqwest
//! clients are internally pooled and safe for concurrent use by
//! independent requests.

use std::time::Duration;

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client` with the given request timeout.
pub fn build_http_client(timeout: Duration) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::InvalidConfig {
            message: format!("failed to build HTTP client: {}", e),
        })
}
