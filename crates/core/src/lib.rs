//! Switchboard Core
//!
//! Shared models, configuration, and error types for the Switchboard
//! workspace. This crate has no knowledge of any concrete backend; the
//! llm and rag crates build on these types, and the root crate wires
//! everything together.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `models` - Agent kinds, messages, routing decisions, retrieval types
//! - `config` - Layered settings (`Settings` and per-backend sections)
//! - `streaming` - Stream event types for incremental generation output

pub mod config;
pub mod error;
pub mod models;
pub mod streaming;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Data Models ────────────────────────────────────────────────────────
pub use models::{
    AgentKind, Citation, Message, MessageRole, RetrievedDocument, RouteMethod, RoutingDecision,
};

// ── Configuration ──────────────────────────────────────────────────────
pub use config::{OllamaConfig, QdrantConfig, RagConfig, RouterConfig, Settings};

// ── Streaming ──────────────────────────────────────────────────────────
pub use streaming::StreamEvent;
