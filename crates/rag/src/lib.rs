//! Switchboard RAG
//!
//! Retrieval-augmented generation for the Switchboard orchestrator:
//! document chunking, vector indexing and retrieval, and citation-backed
//! answering with an explicit degraded mode when retrieval is unavailable.
//!
//! ## Module Organization
//!
//! - `chunker` - Pure recursive text splitter with overlap
//! - `store` - `VectorStore` trait and point/filter types
//! - `qdrant` - Qdrant REST implementation of `VectorStore`
//! - `pipeline` - `RagPipeline`: index, search, query, delete

pub mod chunker;
pub mod pipeline;
pub mod qdrant;
pub mod store;

// Re-export main types
pub use chunker::TextChunker;
pub use pipeline::{
    build_rag_prompt, format_context, DocumentChunk, RagError, RagPipeline, RagResult,
    SearchOptions, NO_CONTEXT_NOTICE,
};
pub use qdrant::QdrantStore;
pub use store::{Filter, ScoredPoint, StoreError, StoreResult, VectorPoint, VectorStore};
