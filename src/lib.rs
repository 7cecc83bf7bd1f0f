//! Switchboard
//!
//! The orchestrator core: decides which specialized task handler should
//! answer a natural-language request, and grounds knowledge answers in an
//! indexed corpus via retrieval-augmented generation.
//!
//! The interesting decisions live in two places:
//!
//! - [`router`] - multi-signal pattern scoring with a layered escalation
//!   policy (forced handler, pattern winner, priority weights, LLM
//!   fallback, chat default)
//! - the RAG pipeline (re-exported from `switchboard-rag`) - chunking,
//!   vector retrieval, and citation assembly with an explicit degraded
//!   mode when retrieval is unavailable
//!
//! Task handlers themselves, transport endpoints, and session persistence
//! are external collaborators; [`AppContext`] wires the core against its
//! backends and hands out shared component handles.

pub mod context;
pub mod entities;
pub mod extract;
pub mod router;

// ── Core decision surface ──────────────────────────────────────────────
pub use context::AppContext;
pub use entities::{extract_entities, ExtractedEntities};
pub use extract::{extract_json, parse_command, ParsedCommand};
pub use router::{pattern_scores, resolve_by_priority, Router};

// ── Workspace re-exports ───────────────────────────────────────────────
pub use switchboard_core::{
    AgentKind, Citation, CoreError, CoreResult, Message, MessageRole, RetrievedDocument,
    RouteMethod, RoutingDecision, Settings, StreamEvent,
};
pub use switchboard_llm::{
    GenerationOptions, LlmError, LlmResult, OllamaProvider, TextEmbedder, TextGenerator,
};
pub use switchboard_rag::{
    QdrantStore, RagError, RagPipeline, RagResult, SearchOptions, TextChunker, VectorStore,
};
