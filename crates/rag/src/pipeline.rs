//! RAG Pipeline
//!
//! Indexing, retrieval, and citation-backed answering over the vector
//! store. The pipeline owns no backend of its own: it is composed from a
//! `TextEmbedder`, a `TextGenerator`, and a `VectorStore`, which keeps the
//! whole flow testable with in-memory fakes.
//!
//! Retrieval failures inside `query` degrade instead of propagating: the
//! answer is generated without document context and explicitly annotated
//! as ungrounded. Everything else surfaces errors to the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use switchboard_core::{Citation, RagConfig, RetrievedDocument};
use switchboard_llm::{GenerationOptions, LlmError, TextEmbedder, TextGenerator};

use super::chunker::TextChunker;
use super::store::{Filter, StoreError, VectorPoint, VectorStore};

/// Page size used when collecting point ids for deletion.
const SCROLL_PAGE_SIZE: usize = 1000;

/// Appended to answers that were generated without any retrieved context.
pub const NO_CONTEXT_NOTICE: &str =
    "Note: this answer could not be grounded in any indexed documents.";

/// Errors surfaced by the RAG pipeline.
#[derive(Error, Debug)]
pub enum RagError {
    /// Missing or malformed caller input (empty query, empty document id).
    #[error("validation error: {0}")]
    Validation(String),

    /// A generation or embedding backend call failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// A vector store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for pipeline results.
pub type RagResult<T> = Result<T, RagError>;

/// One bounded slice of a document, ready for embedding.
///
/// Invariant: `chunk_index < total_chunks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub doc_id: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub text: String,
}

/// Optional retrieval parameters; `None` fields fall back to configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub top_k: Option<usize>,
    pub score_threshold: Option<f32>,
    /// Restrict hits to chunks of one document.
    pub doc_id: Option<String>,
    /// Additional equality conditions on chunk metadata.
    pub metadata: Option<Map<String, Value>>,
}

/// Retrieval-augmented generation over an indexed corpus.
pub struct RagPipeline {
    embedder: Arc<dyn TextEmbedder>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn VectorStore>,
    config: RagConfig,
    chunker: TextChunker,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn VectorStore>,
        config: RagConfig,
    ) -> Self {
        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap);
        Self {
            embedder,
            generator,
            store,
            config,
            chunker,
        }
    }

    /// Split a document into chunks tagged with their position.
    pub fn chunk_document(&self, doc_id: &str, content: &str) -> Vec<DocumentChunk> {
        let texts = self.chunker.split(content);
        let total = texts.len();
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| DocumentChunk {
                doc_id: doc_id.to_string(),
                chunk_index: i,
                total_chunks: total,
                text,
            })
            .collect()
    }

    /// Index a document: chunk, embed, and upsert one point per chunk.
    ///
    /// Returns the number of chunks indexed. A document producing zero
    /// chunks indexes nothing and never calls the embedding backend.
    pub async fn index_document(
        &self,
        doc_id: &str,
        content: &str,
        metadata: &Map<String, Value>,
    ) -> RagResult<usize> {
        if doc_id.trim().is_empty() {
            return Err(RagError::Validation(
                "document id must not be empty".to_string(),
            ));
        }

        let chunks = self.chunk_document(doc_id, content);
        tracing::debug!("split document {} into {} chunks", doc_id, chunks.len());
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed(&texts).await?;

        let points: Vec<VectorPoint> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| {
                let mut payload = Map::new();
                payload.insert("doc_id".to_string(), Value::from(chunk.doc_id.clone()));
                payload.insert("content".to_string(), Value::from(chunk.text.clone()));
                payload.insert("chunk_index".to_string(), Value::from(chunk.chunk_index));
                payload.insert("total_chunks".to_string(), Value::from(chunk.total_chunks));
                payload.extend(metadata.clone());
                VectorPoint {
                    id: Uuid::new_v4().to_string(),
                    vector,
                    payload,
                }
            })
            .collect();

        let count = points.len();
        self.store.upsert(points).await?;
        tracing::info!("indexed document {} ({} chunks)", doc_id, count);
        Ok(count)
    }

    /// Similarity search over the indexed corpus.
    ///
    /// Hits keep the store's descending-similarity order. No hits is an
    /// empty list, not an error.
    pub async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> RagResult<Vec<RetrievedDocument>> {
        if query.trim().is_empty() {
            return Err(RagError::Validation("query must not be empty".to_string()));
        }

        let top_k = options.top_k.unwrap_or(self.config.top_k);
        let score_threshold = options
            .score_threshold
            .unwrap_or(self.config.score_threshold);

        let query_vector = self.embedder.embed_query(query).await?;

        let mut filter = Filter::new();
        if let Some(doc_id) = &options.doc_id {
            filter = filter.must_match("doc_id", doc_id.clone());
        }
        if let Some(metadata) = &options.metadata {
            for (key, value) in metadata {
                filter = filter.must_match(key.clone(), value.clone());
            }
        }
        let filter = (!filter.is_empty()).then_some(filter);

        let hits = self
            .store
            .search(&query_vector, filter.as_ref(), top_k, score_threshold)
            .await?;

        let documents: Vec<RetrievedDocument> = hits
            .into_iter()
            .map(|hit| {
                let content = hit
                    .payload
                    .get("content")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let metadata: Map<String, Value> = hit
                    .payload
                    .into_iter()
                    .filter(|(key, _)| key != "content")
                    .collect();
                RetrievedDocument {
                    id: hit.id,
                    content,
                    metadata,
                    score: hit.score,
                }
            })
            .collect();

        tracing::debug!("search returned {} documents", documents.len());
        Ok(documents)
    }

    /// Answer a question with retrieval augmentation.
    ///
    /// Returns the generated answer and one citation per retrieved
    /// document, in retrieval order. A failing or empty index degrades to
    /// an unaugmented answer annotated with [`NO_CONTEXT_NOTICE`].
    pub async fn query(
        &self,
        query: &str,
        system_instructions: Option<&str>,
        top_k: Option<usize>,
    ) -> RagResult<(String, Vec<Citation>)> {
        let options = SearchOptions {
            top_k,
            ..SearchOptions::default()
        };
        let documents = match self.search(query, &options).await {
            Ok(documents) => documents,
            Err(err @ RagError::Validation(_)) => return Err(err),
            Err(err) => {
                tracing::warn!("retrieval failed, answering without context: {}", err);
                Vec::new()
            }
        };

        let context = format_context(&documents);
        let prompt = build_rag_prompt(query, &context, system_instructions);

        let mut answer = self
            .generator
            .generate(&prompt, None, &GenerationOptions::default())
            .await?;

        if documents.is_empty() {
            if !answer.is_empty() {
                answer.push_str("\n\n");
            }
            answer.push_str(NO_CONTEXT_NOTICE);
        }

        let citations: Vec<Citation> = documents
            .iter()
            .enumerate()
            .map(|(i, doc)| Citation {
                index: i + 1,
                source: doc
                    .metadata
                    .get("doc_id")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                excerpt: excerpt(&doc.content, 200),
                score: doc.score,
            })
            .collect();

        Ok((answer, citations))
    }

    /// Delete every chunk of a document by its id.
    ///
    /// Returns the number of points removed; deleting an already-deleted
    /// document returns 0.
    pub async fn delete_document(&self, doc_id: &str) -> RagResult<usize> {
        if doc_id.trim().is_empty() {
            return Err(RagError::Validation(
                "document id must not be empty".to_string(),
            ));
        }

        let filter = Filter::new().must_match("doc_id", doc_id);
        let ids = self.store.scroll_ids(&filter, SCROLL_PAGE_SIZE).await?;
        if ids.is_empty() {
            return Ok(0);
        }

        self.store.delete(&ids).await?;
        tracing::info!("deleted document {} ({} points)", doc_id, ids.len());
        Ok(ids.len())
    }
}

/// Format retrieved documents into a source-tagged context block.
pub fn format_context(documents: &[RetrievedDocument]) -> String {
    if documents.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let source = doc
                .metadata
                .get("doc_id")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            format!("[Source {}: {}]\n{}", i + 1, source, doc.content)
        })
        .collect();
    parts.join("\n\n---\n\n")
}

/// Compose the augmented prompt: instructions, context block (omitted when
/// empty), then the question.
pub fn build_rag_prompt(query: &str, context: &str, system_instructions: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(instructions) = system_instructions {
        parts.push(instructions.to_string());
    }

    if !context.is_empty() {
        parts.push(format!(
            "Use the following context to answer the question. If the context \
             doesn't contain relevant information, say so and answer based on \
             your general knowledge.\n\nContext:\n{}",
            context
        ));
    }

    parts.push(format!("Question: {}", query));
    parts.join("\n\n")
}

/// First `limit` characters of `text`, with a trailing ellipsis kept
/// inside the limit when truncation happens.
fn excerpt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
