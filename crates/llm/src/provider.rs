//! Backend Provider Traits
//!
//! Defines the narrow interfaces the orchestrator core uses to talk to its
//! generation and embedding backends. Both traits are object safe and
//! `Send + Sync` so implementations can be shared across Tokio tasks and
//! replaced with fakes in tests.
//!
//! Generation is a distinct responsibility from embedding; a single
//! backend (such as Ollama) may implement both traits, but callers only
//! ever depend on the capability they need.

use async_trait::async_trait;
use tokio::sync::mpsc;

use switchboard_core::{Message, StreamEvent};

use super::types::{GenerationOptions, LlmError, LlmResult};

/// Text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion from a single prompt, outside any
    /// conversation history.
    ///
    /// # Arguments
    /// * `prompt` - The user prompt
    /// * `system` - Optional system prompt
    /// * `options` - Sampling and budget overrides
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &GenerationOptions,
    ) -> LlmResult<String>;

    /// Generate the next assistant turn for a conversation.
    async fn chat(&self, messages: &[Message], options: &GenerationOptions) -> LlmResult<String>;

    /// Stream the next assistant turn, pushing events into `tx`.
    ///
    /// `TextDelta` events carry incremental content; `Complete` is sent
    /// when the backend signals the end of the stream. Returns the full
    /// accumulated text after the stream terminates.
    async fn chat_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
        tx: mpsc::Sender<StreamEvent>,
    ) -> LlmResult<String>;

    /// Check if the backend is reachable and serving.
    async fn health_check(&self) -> LlmResult<()>;

    /// List the models the backend has available.
    async fn list_models(&self) -> LlmResult<Vec<String>>;
}

/// Text embedding backend.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a batch of texts into dense vectors, one per input, all with
    /// the same dimensionality.
    async fn embed(&self, texts: &[&str]) -> LlmResult<Vec<Vec<f32>>>;

    /// Embed a single query text.
    ///
    /// The default implementation delegates to `embed` with a one-element
    /// slice.
    async fn embed_query(&self, query: &str) -> LlmResult<Vec<f32>> {
        let vectors = self.embed(&[query]).await?;
        vectors.into_iter().next().ok_or_else(|| LlmError::Other {
            message: "embed returned no vector for single query".to_string(),
        })
    }

    /// Dimensionality of the vectors this backend produces.
    fn dimension(&self) -> usize;
}

/// Map an HTTP error status to an `LlmError`.
pub fn parse_http_error(status: u16, body: &str) -> LlmError {
    match status {
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
