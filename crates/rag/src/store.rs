//! Vector Store Abstraction
//!
//! The narrow interface the RAG pipeline uses to talk to its vector
//! database. One indexed chunk maps to exactly one stored point. The
//! trait is object safe and `Send + Sync` so tests can swap in an
//! in-memory implementation.
//!
//! Store calls are not retried by the pipeline; failures propagate
//! immediately and fallback policy stays with the caller.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors surfaced by a vector store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Client configuration is invalid or incomplete.
    #[error("vector store config error: {0}")]
    Config(String),

    /// The store is not reachable or not running.
    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    /// A network error occurred mid-request.
    #[error("vector store network error: {0}")]
    Network(String),

    /// The store returned an HTTP error.
    #[error("vector store returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// The store returned an unexpected or unparseable response.
    #[error("unexpected vector store response: {0}")]
    Parse(String),
}

/// Convenience alias for store operation results.
pub type StoreResult<T> = Result<T, StoreError>;

/// A point to be written into the store.
#[derive(Debug, Clone, Serialize)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

/// A search hit, ranked by descending similarity.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, Value>,
}

/// Conjunction of equality conditions on payload fields.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key == value` on the point payload.
    pub fn must_match(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }
}

/// Vector database operations the pipeline depends on.
///
/// Implementations own their collection (auto-creating it on first use)
/// and must be safe for concurrent use by independent requests.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace points by id.
    async fn upsert(&self, points: Vec<VectorPoint>) -> StoreResult<()>;

    /// Similarity search, best hits first, bounded by `limit` and a
    /// minimum similarity `score_threshold`.
    async fn search(
        &self,
        vector: &[f32],
        filter: Option<&Filter>,
        limit: usize,
        score_threshold: f32,
    ) -> StoreResult<Vec<ScoredPoint>>;

    /// Collect the ids of every point matching `filter`, paging through
    /// the collection in batches of at most `page_size`.
    async fn scroll_ids(&self, filter: &Filter, page_size: usize) -> StoreResult<Vec<String>>;

    /// Delete points by id. Unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_collects_conditions() {
        let filter = Filter::new()
            .must_match("doc_id", "report-7")
            .must_match("team", "platform");
        assert!(!filter.is_empty());
        assert_eq!(filter.conditions().len(), 2);
        assert_eq!(filter.conditions()[0].0, "doc_id");
        assert_eq!(filter.conditions()[0].1, Value::from("report-7"));
    }

    #[test]
    fn empty_filter_reports_empty() {
        assert!(Filter::new().is_empty());
    }

    #[test]
    fn store_trait_is_object_safe() {
        fn _assert_object_safe(_: &dyn VectorStore) {}
    }
}
