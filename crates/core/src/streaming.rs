//! Streaming Event Types
//!
//! Backend-agnostic events for incremental generation output. Providers
//! push these over a `tokio::sync::mpsc::Sender` while a streaming chat
//! call is in flight; `Complete` is always the final event of a
//! successfully terminated stream.

use serde::{Deserialize, Serialize};

/// A single event in a streamed generation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text produced by the model.
    TextDelta { content: String },

    /// The stream failed mid-flight; no `Complete` will follow.
    Error { message: String },

    /// The backend signalled the end of the stream.
    Complete,
}
