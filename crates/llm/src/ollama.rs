//! Ollama Provider
//!
//! Implements `TextGenerator` and `TextEmbedder` against the Ollama HTTP
//! API with a shared reqwest client. Generation and chat calls run under
//! the bounded-backoff retry policy; embedding and streaming calls
//! propagate failures immediately.
//!
//! Endpoints used: `/api/generate`, `/api/chat` (non-streaming and NDJSON
//! streaming), `/api/embeddings`, and `/api/tags` for health checks and
//! model listing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use url::Url;

use switchboard_core::{Message, OllamaConfig, StreamEvent};

use super::http_client::build_http_client;
use super::provider::{parse_http_error, TextEmbedder, TextGenerator};
use super::retry::{with_retry, RetryPolicy};
use super::types::{GenerationOptions, LlmError, LlmResult};

/// Default dimension for nomic-embed-text; refined after the first
/// successful embedding call.
const DEFAULT_EMBED_DIMENSION: usize = 768;

/// Ollama backend client.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    chat_model: String,
    embed_model: String,
    max_tokens: u32,
    retry: RetryPolicy,
    /// Detected embedding dimension, updated after the first successful
    /// embedding call. Atomic for lock-free interior mutability under the
    /// `Send + Sync` trait requirement.
    embed_dimension: AtomicUsize,
}

impl OllamaProvider {
    /// Create a provider from configuration. The HTTP client is built once
    /// here and reused for every request.
    pub fn new(config: &OllamaConfig) -> LlmResult<Self> {
        let parsed = Url::parse(&config.base_url).map_err(|e| LlmError::InvalidConfig {
            message: format!("invalid Ollama base URL {:?}: {}", config.base_url, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LlmError::InvalidConfig {
                message: format!("Ollama base URL must be http(s), got {}", parsed.scheme()),
            });
        }

        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            embed_model: config.embed_model.clone(),
            max_tokens: config.max_tokens,
            retry: RetryPolicy::default(),
            embed_dimension: AtomicUsize::new(DEFAULT_EMBED_DIMENSION),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_connect() {
            LlmError::ProviderUnavailable {
                message: format!(
                    "Cannot connect to Ollama at {}. Is the Ollama server running? \
                     Start it with: ollama serve",
                    self.base_url
                ),
            }
        } else {
            LlmError::NetworkError {
                message: err.to_string(),
            }
        }
    }

    /// Turn a non-success response into an `LlmError`, passing success
    /// responses through.
    async fn check_status(&self, response: reqwest::Response) -> LlmResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(parse_http_error(status.as_u16(), &body))
    }

    fn model_options(&self, options: &GenerationOptions) -> serde_json::Value {
        serde_json::json!({
            "temperature": options.temperature,
            "num_predict": options.max_tokens.unwrap_or(self.max_tokens),
        })
    }

    fn chat_body(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
        stream: bool,
    ) -> serde_json::Value {
        let wire: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();
        serde_json::json!({
            "model": options.model.as_deref().unwrap_or(&self.chat_model),
            "messages": wire,
            "stream": stream,
            "options": self.model_options(options),
        })
    }

    /// One non-retried `/api/generate` round trip.
    async fn send_generate(&self, body: &serde_json::Value) -> LlmResult<String> {
        let response = self
            .client
            .post(self.endpoint("/api/generate"))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let response = self.check_status(response).await?;
        let parsed: GenerateResponse =
            response.json().await.map_err(|e| LlmError::ParseError {
                message: format!("unexpected /api/generate response: {}", e),
            })?;
        Ok(parsed.response)
    }

    /// One non-retried `/api/chat` round trip.
    async fn send_chat(&self, body: &serde_json::Value) -> LlmResult<String> {
        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let response = self.check_status(response).await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| LlmError::ParseError {
            message: format!("unexpected /api/chat response: {}", e),
        })?;
        Ok(parsed.message.map(|m| m.content).unwrap_or_default())
    }

    fn update_dimension(&self, vector: &[f32]) {
        if !vector.is_empty() {
            self.embed_dimension.store(vector.len(), Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: &GenerationOptions,
    ) -> LlmResult<String> {
        let mut body = serde_json::json!({
            "model": options.model.as_deref().unwrap_or(&self.chat_model),
            "prompt": prompt,
            "stream": false,
            "options": self.model_options(options),
        });
        if let Some(system) = system {
            body["system"] = serde_json::json!(system);
        }

        tracing::debug!(
            "generating completion (model={}, prompt_len={})",
            body["model"],
            prompt.len()
        );
        with_retry(&self.retry, "ollama generate", || self.send_generate(&body)).await
    }

    async fn chat(&self, messages: &[Message], options: &GenerationOptions) -> LlmResult<String> {
        let body = self.chat_body(messages, options, false);
        tracing::debug!("chat completion ({} messages)", messages.len());
        with_retry(&self.retry, "ollama chat", || self.send_chat(&body)).await
    }

    async fn chat_stream(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
        tx: mpsc::Sender<StreamEvent>,
    ) -> LlmResult<String> {
        let body = self.chat_body(messages, options, true);
        tracing::debug!("streaming chat ({} messages)", messages.len());

        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let response = self.check_status(response).await?;

        let mut accumulated = String::new();
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let err = self.map_transport_error(e);
                    let _ = tx
                        .send(StreamEvent::Error {
                            message: err.to_string(),
                        })
                        .await;
                    return Err(err);
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(line_end) = buffer.find('\n') {
                let line = buffer[..line_end].to_string();
                buffer = buffer[line_end + 1..].to_string();
                if line.trim().is_empty() {
                    continue;
                }

                let parsed: ChatStreamChunk =
                    serde_json::from_str(&line).map_err(|e| LlmError::ParseError {
                        message: format!("unexpected stream line: {}", e),
                    })?;
                if let Some(message) = parsed.message {
                    if !message.content.is_empty() {
                        accumulated.push_str(&message.content);
                        let _ = tx
                            .send(StreamEvent::TextDelta {
                                content: message.content,
                            })
                            .await;
                    }
                }
                if parsed.done {
                    let _ = tx.send(StreamEvent::Complete).await;
                    return Ok(accumulated);
                }
            }
        }

        // The connection closed without an explicit done marker; treat the
        // end of the byte stream as completion.
        let _ = tx.send(StreamEvent::Complete).await;
        Ok(accumulated)
    }

    async fn health_check(&self) -> LlmResult<()> {
        let response = self
            .client
            .get(self.endpoint("/api/tags"))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn list_models(&self) -> LlmResult<Vec<String>> {
        let response = self
            .client
            .get(self.endpoint("/api/tags"))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let response = self.check_status(response).await?;
        let parsed: TagsResponse = response.json().await.map_err(|e| LlmError::ParseError {
            message: format!("unexpected /api/tags response: {}", e),
        })?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl TextEmbedder for OllamaProvider {
    async fn embed(&self, texts: &[&str]) -> LlmResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        // The embeddings endpoint takes one prompt per request.
        for text in texts {
            let body = serde_json::json!({
                "model": self.embed_model,
                "prompt": text,
            });
            let response = self
                .client
                .post(self.endpoint("/api/embeddings"))
                .json(&body)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            let response = self.check_status(response).await?;
            let parsed: EmbeddingsResponse =
                response.json().await.map_err(|e| LlmError::ParseError {
                    message: format!("unexpected /api/embeddings response: {}", e),
                })?;
            if parsed.embedding.is_empty() {
                return Err(LlmError::ParseError {
                    message: format!("Ollama returned an empty embedding for model {}", self.embed_model),
                });
            }
            embeddings.push(parsed.embedding);
        }

        if let Some(first) = embeddings.first() {
            let dim = first.len();
            if embeddings.iter().any(|v| v.len() != dim) {
                return Err(LlmError::ParseError {
                    message: "embedding batch has inconsistent dimensions".to_string(),
                });
            }
            self.update_dimension(first);
        }

        tracing::debug!("generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.embed_dimension.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatStreamChunk {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
