//! End-to-end pipeline tests against in-memory fakes.
//!
//! The fakes implement the same traits the real backends do, so these
//! tests exercise the full index -> search -> query -> delete flow without
//! a running Ollama or Qdrant.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use switchboard_core::{Message, RagConfig, StreamEvent};
use switchboard_llm::{GenerationOptions, LlmResult, TextEmbedder, TextGenerator};
use switchboard_rag::{
    Filter, RagError, RagPipeline, ScoredPoint, SearchOptions, StoreError, StoreResult,
    VectorPoint, VectorStore, NO_CONTEXT_NOTICE,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Deterministic embedder that counts how many batches it was asked for.
struct FakeEmbedder {
    batches: AtomicUsize,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            batches: AtomicUsize::new(0),
        }
    }

    fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextEmbedder for FakeEmbedder {
    async fn embed(&self, texts: &[&str]) -> LlmResult<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                let len = t.chars().count() as f32;
                vec![len, len / 2.0, 1.0, 0.0]
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        4
    }
}

/// Generator with a canned reply.
struct FakeGenerator {
    reply: String,
}

impl FakeGenerator {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _system: Option<&str>,
        _options: &GenerationOptions,
    ) -> LlmResult<String> {
        Ok(self.reply.clone())
    }

    async fn chat(&self, _messages: &[Message], _options: &GenerationOptions) -> LlmResult<String> {
        Ok(self.reply.clone())
    }

    async fn chat_stream(
        &self,
        _messages: &[Message],
        _options: &GenerationOptions,
        tx: tokio::sync::mpsc::Sender<StreamEvent>,
    ) -> LlmResult<String> {
        let _ = tx
            .send(StreamEvent::TextDelta {
                content: self.reply.clone(),
            })
            .await;
        let _ = tx.send(StreamEvent::Complete).await;
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    async fn list_models(&self) -> LlmResult<Vec<String>> {
        Ok(vec!["fake".to_string()])
    }
}

/// In-memory vector store: every stored point matches any query with a
/// fixed similarity of 1.0, filtered and bounded like the real store.
#[derive(Default)]
struct InMemoryStore {
    points: Mutex<Vec<VectorPoint>>,
}

impl InMemoryStore {
    fn matches(filter: &Filter, payload: &Map<String, Value>) -> bool {
        filter
            .conditions()
            .iter()
            .all(|(key, value)| payload.get(key) == Some(value))
    }

    fn stored_payloads(&self) -> Vec<Map<String, Value>> {
        self.points
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.payload.clone())
            .collect()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, points: Vec<VectorPoint>) -> StoreResult<()> {
        let mut stored = self.points.lock().unwrap();
        for point in points {
            stored.retain(|p| p.id != point.id);
            stored.push(point);
        }
        Ok(())
    }

    async fn search(
        &self,
        _vector: &[f32],
        filter: Option<&Filter>,
        limit: usize,
        _score_threshold: f32,
    ) -> StoreResult<Vec<ScoredPoint>> {
        let stored = self.points.lock().unwrap();
        Ok(stored
            .iter()
            .filter(|p| filter.map_or(true, |f| Self::matches(f, &p.payload)))
            .take(limit)
            .map(|p| ScoredPoint {
                id: p.id.clone(),
                score: 1.0,
                payload: p.payload.clone(),
            })
            .collect())
    }

    async fn scroll_ids(&self, filter: &Filter, _page_size: usize) -> StoreResult<Vec<String>> {
        let stored = self.points.lock().unwrap();
        Ok(stored
            .iter()
            .filter(|p| Self::matches(filter, &p.payload))
            .map(|p| p.id.clone())
            .collect())
    }

    async fn delete(&self, ids: &[String]) -> StoreResult<()> {
        let mut stored = self.points.lock().unwrap();
        stored.retain(|p| !ids.contains(&p.id));
        Ok(())
    }
}

/// Store whose every call fails, simulating an unreachable vector
/// database.
struct FailingStore;

#[async_trait]
impl VectorStore for FailingStore {
    async fn upsert(&self, _points: Vec<VectorPoint>) -> StoreResult<()> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn search(
        &self,
        _vector: &[f32],
        _filter: Option<&Filter>,
        _limit: usize,
        _score_threshold: f32,
    ) -> StoreResult<Vec<ScoredPoint>> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn scroll_ids(&self, _filter: &Filter, _page_size: usize) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    async fn delete(&self, _ids: &[String]) -> StoreResult<()> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    embedder: Arc<FakeEmbedder>,
    store: Arc<InMemoryStore>,
    pipeline: RagPipeline,
}

fn harness() -> Harness {
    harness_with_reply("The refund window is 30 days.")
}

fn harness_with_reply(reply: &str) -> Harness {
    let embedder = Arc::new(FakeEmbedder::new());
    let store = Arc::new(InMemoryStore::default());
    let generator = Arc::new(FakeGenerator::new(reply));
    let config = RagConfig {
        chunk_size: 50,
        chunk_overlap: 10,
        ..RagConfig::default()
    };
    let pipeline = RagPipeline::new(
        embedder.clone(),
        generator,
        store.clone(),
        config,
    );
    Harness {
        embedder,
        store,
        pipeline,
    }
}

const SAMPLE_DOC: &str = "Refund requests are accepted within thirty days of purchase.\n\n\
                          Requests must include the original receipt and order number.\n\n\
                          Store credit is issued for returns made after the window closes.";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_then_delete_roundtrip() {
    let h = harness();
    let indexed = h
        .pipeline
        .index_document("policy", SAMPLE_DOC, &Map::new())
        .await
        .unwrap();
    assert!(indexed > 1, "expected multiple chunks, got {indexed}");

    let deleted = h.pipeline.delete_document("policy").await.unwrap();
    assert_eq!(deleted, indexed);

    // A repeated delete on the same id removes nothing.
    let deleted_again = h.pipeline.delete_document("policy").await.unwrap();
    assert_eq!(deleted_again, 0);
}

#[tokio::test]
async fn empty_document_skips_the_embedder() {
    let h = harness();
    let indexed = h
        .pipeline
        .index_document("empty", "   \n  ", &Map::new())
        .await
        .unwrap();
    assert_eq!(indexed, 0);
    assert_eq!(h.embedder.batch_count(), 0);
}

#[tokio::test]
async fn empty_document_id_is_rejected() {
    let h = harness();
    let result = h.pipeline.index_document("  ", "content", &Map::new()).await;
    assert!(matches!(result, Err(RagError::Validation(_))));

    let result = h.pipeline.delete_document("").await;
    assert!(matches!(result, Err(RagError::Validation(_))));
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let h = harness();
    let result = h.pipeline.search("", &SearchOptions::default()).await;
    assert!(matches!(result, Err(RagError::Validation(_))));
}

#[tokio::test]
async fn chunk_payloads_keep_position_invariants() {
    let h = harness();
    h.pipeline
        .index_document("policy", SAMPLE_DOC, &Map::new())
        .await
        .unwrap();

    for payload in h.store.stored_payloads() {
        let index = payload["chunk_index"].as_u64().unwrap();
        let total = payload["total_chunks"].as_u64().unwrap();
        assert!(index < total, "chunk_index {index} >= total_chunks {total}");
        assert_eq!(payload["doc_id"], "policy");
        assert!(payload["content"].as_str().is_some());
    }
}

#[tokio::test]
async fn search_returns_documents_with_metadata() {
    let h = harness();
    let mut metadata = Map::new();
    metadata.insert("team".to_string(), Value::from("support"));
    h.pipeline
        .index_document("policy", SAMPLE_DOC, &metadata)
        .await
        .unwrap();

    let docs = h
        .pipeline
        .search("refund window", &SearchOptions::default())
        .await
        .unwrap();
    assert!(!docs.is_empty());
    for doc in &docs {
        assert!(!doc.content.is_empty());
        assert_eq!(doc.metadata["team"], "support");
        assert_eq!(doc.metadata["doc_id"], "policy");
        // The chunk text lives in `content`, not in the metadata map.
        assert!(!doc.metadata.contains_key("content"));
    }
}

#[tokio::test]
async fn search_filters_by_document_id() {
    let h = harness();
    h.pipeline
        .index_document("policy", SAMPLE_DOC, &Map::new())
        .await
        .unwrap();
    h.pipeline
        .index_document("faq", "Contact support before returning an item.", &Map::new())
        .await
        .unwrap();

    let options = SearchOptions {
        doc_id: Some("faq".to_string()),
        ..SearchOptions::default()
    };
    let docs = h.pipeline.search("returns", &options).await.unwrap();
    assert!(!docs.is_empty());
    for doc in &docs {
        assert_eq!(doc.metadata["doc_id"], "faq");
    }
}

#[tokio::test]
async fn search_respects_top_k() {
    let h = harness();
    h.pipeline
        .index_document("policy", SAMPLE_DOC, &Map::new())
        .await
        .unwrap();

    let options = SearchOptions {
        top_k: Some(1),
        ..SearchOptions::default()
    };
    let docs = h.pipeline.search("refunds", &options).await.unwrap();
    assert_eq!(docs.len(), 1);
}

#[tokio::test]
async fn query_against_empty_index_is_flagged() {
    let h = harness();
    let (answer, citations) = h
        .pipeline
        .query("What is the refund policy?", None, None)
        .await
        .unwrap();
    assert!(!answer.is_empty());
    assert!(answer.contains(NO_CONTEXT_NOTICE));
    assert!(citations.is_empty());
}

#[tokio::test]
async fn query_degrades_when_retrieval_fails() {
    let pipeline = RagPipeline::new(
        Arc::new(FakeEmbedder::new()),
        Arc::new(FakeGenerator::new("Best effort answer.")),
        Arc::new(FailingStore),
        RagConfig::default(),
    );
    let (answer, citations) = pipeline
        .query("What is the refund policy?", None, None)
        .await
        .unwrap();
    assert!(answer.starts_with("Best effort answer."));
    assert!(answer.contains(NO_CONTEXT_NOTICE));
    assert!(citations.is_empty());
}

#[tokio::test]
async fn indexing_failures_propagate() {
    let pipeline = RagPipeline::new(
        Arc::new(FakeEmbedder::new()),
        Arc::new(FakeGenerator::new("unused")),
        Arc::new(FailingStore),
        RagConfig::default(),
    );
    let result = pipeline
        .index_document("doc", "some content to index", &Map::new())
        .await;
    assert!(matches!(result, Err(RagError::Store(_))));
}

#[tokio::test]
async fn query_with_documents_produces_ordered_citations() {
    let h = harness();
    h.pipeline
        .index_document("policy", SAMPLE_DOC, &Map::new())
        .await
        .unwrap();

    let (answer, citations) = h
        .pipeline
        .query("What is the refund policy?", None, None)
        .await
        .unwrap();
    assert_eq!(answer, "The refund window is 30 days.");
    assert!(!answer.contains(NO_CONTEXT_NOTICE));
    assert!(!citations.is_empty());
    for (i, citation) in citations.iter().enumerate() {
        assert_eq!(citation.index, i + 1);
        assert_eq!(citation.source, "policy");
        assert!(citation.excerpt.chars().count() <= 200);
        assert!(citation.score > 0.0);
    }
}

#[tokio::test]
async fn query_with_system_instructions_still_answers() {
    let h = harness_with_reply("Certainly.");
    let (answer, _) = h
        .pipeline
        .query("Anything indexed?", Some("Answer in one word."), None)
        .await
        .unwrap();
    assert!(answer.starts_with("Certainly."));
}

#[tokio::test]
async fn reindexing_after_delete_starts_clean() {
    let h = harness();
    let first = h
        .pipeline
        .index_document("policy", SAMPLE_DOC, &Map::new())
        .await
        .unwrap();
    h.pipeline.delete_document("policy").await.unwrap();
    let second = h
        .pipeline
        .index_document("policy", SAMPLE_DOC, &Map::new())
        .await
        .unwrap();
    assert_eq!(first, second);

    let deleted = h.pipeline.delete_document("policy").await.unwrap();
    assert_eq!(deleted, second);
}
