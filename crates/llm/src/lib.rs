//! Switchboard LLM
//!
//! Generation and embedding backend clients for the Switchboard
//! orchestrator. The `TextGenerator` and `TextEmbedder` traits are the
//! narrow interfaces the rest of the workspace depends on; `OllamaProvider`
//! implements both against a local Ollama server.
//!
//! Generation calls run under a bounded exponential-backoff retry policy
//! and re-raise after the final attempt. Embedding calls are not retried;
//! fallback policy belongs to the caller.

pub mod http_client;
pub mod ollama;
pub mod provider;
pub mod retry;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use ollama::OllamaProvider;
pub use provider::{parse_http_error, TextEmbedder, TextGenerator};
pub use retry::{with_retry, RetryPolicy};
pub use types::{GenerationOptions, LlmError, LlmResult};
