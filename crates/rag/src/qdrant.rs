//! Qdrant Vector Store
//!
//! `VectorStore` implementation over the Qdrant REST API with a shared
//! reqwest client. The collection is created lazily on first use with the
//! configured dimensionality and cosine distance; creation runs at most
//! once per store instance.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use switchboard_core::QdrantConfig;

use super::store::{Filter, ScoredPoint, StoreError, StoreResult, VectorPoint, VectorStore};

/// Qdrant REST client bound to a single collection.
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    vector_dim: usize,
    api_key: Option<String>,
    collection_ready: OnceCell<()>,
}

impl QdrantStore {
    /// Create a store from configuration. The HTTP client is built once
    /// here and reused for every request.
    pub fn new(config: &QdrantConfig) -> StoreResult<Self> {
        if !config.url.starts_with("http://") && !config.url.starts_with("https://") {
            return Err(StoreError::Config(format!(
                "Qdrant URL must be http(s), got {:?}",
                config.url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            vector_dim: config.embedding_dim,
            api_key: config.api_key.clone(),
            collection_ready: OnceCell::new(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("api-key", key);
        }
        builder
    }

    fn collection_path(&self, suffix: &str) -> String {
        format!("/collections/{}{}", self.collection, suffix)
    }

    fn map_transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_connect() {
            StoreError::Unavailable(format!(
                "cannot connect to Qdrant at {}: {}",
                self.base_url, err
            ))
        } else {
            StoreError::Network(err.to_string())
        }
    }

    async fn check_status(&self, response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Create the collection if it does not exist yet. Guarded by a
    /// `OnceCell` so concurrent first calls race at most once.
    async fn ensure_collection(&self) -> StoreResult<()> {
        self.collection_ready
            .get_or_try_init(|| async {
                let response = self
                    .request(reqwest::Method::GET, &self.collection_path(""))
                    .send()
                    .await
                    .map_err(|e| self.map_transport_error(e))?;

                if response.status().as_u16() == 404 {
                    self.create_collection().await?;
                    return Ok(());
                }
                self.check_status(response).await?;
                Ok(())
            })
            .await
            .map(|_| ())
    }

    async fn create_collection(&self) -> StoreResult<()> {
        let body = serde_json::json!({
            "vectors": {
                "size": self.vector_dim,
                "distance": "Cosine",
            }
        });
        let response = self
            .request(reqwest::Method::PUT, &self.collection_path(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        self.check_status(response).await?;
        tracing::info!(
            "created Qdrant collection {} (dim={}, distance=cosine)",
            self.collection,
            self.vector_dim
        );
        Ok(())
    }

    fn filter_json(filter: &Filter) -> Value {
        let must: Vec<Value> = filter
            .conditions()
            .iter()
            .map(|(key, value)| {
                serde_json::json!({
                    "key": key,
                    "match": { "value": value },
                })
            })
            .collect();
        serde_json::json!({ "must": must })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn upsert(&self, points: Vec<VectorPoint>) -> StoreResult<()> {
        if points.is_empty() {
            return Ok(());
        }
        self.ensure_collection().await?;

        let body = serde_json::json!({ "points": points });
        let response = self
            .request(
                reqwest::Method::PUT,
                &self.collection_path("/points?wait=true"),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        filter: Option<&Filter>,
        limit: usize,
        score_threshold: f32,
    ) -> StoreResult<Vec<ScoredPoint>> {
        self.ensure_collection().await?;

        let mut body = serde_json::json!({
            "vector": vector,
            "limit": limit,
            "score_threshold": score_threshold,
            "with_payload": true,
        });
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            body["filter"] = Self::filter_json(filter);
        }

        let response = self
            .request(
                reqwest::Method::POST,
                &self.collection_path("/points/search"),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let response = self.check_status(response).await?;
        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        Ok(parsed
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                id: point_id_to_string(&hit.id),
                score: hit.score,
                payload: hit.payload,
            })
            .collect())
    }

    async fn scroll_ids(&self, filter: &Filter, page_size: usize) -> StoreResult<Vec<String>> {
        self.ensure_collection().await?;

        let mut ids = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = serde_json::json!({
                "filter": Self::filter_json(filter),
                "limit": page_size,
                "with_payload": false,
                "with_vector": false,
            });
            if let Some(offset) = &offset {
                body["offset"] = offset.clone();
            }

            let response = self
                .request(
                    reqwest::Method::POST,
                    &self.collection_path("/points/scroll"),
                )
                .json(&body)
                .send()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            let response = self.check_status(response).await?;
            let parsed: ScrollResponse = response
                .json()
                .await
                .map_err(|e| StoreError::Parse(e.to_string()))?;

            ids.extend(
                parsed
                    .result
                    .points
                    .iter()
                    .map(|p| point_id_to_string(&p.id)),
            );

            match parsed.result.next_page_offset {
                Some(next) if !next.is_null() => offset = Some(next),
                _ => break,
            }
        }

        Ok(ids)
    }

    async fn delete(&self, ids: &[String]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.ensure_collection().await?;

        let body = serde_json::json!({ "points": ids });
        let response = self
            .request(
                reqwest::Method::POST,
                &self.collection_path("/points/delete?wait=true"),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        self.check_status(response).await?;
        Ok(())
    }
}

/// Qdrant point ids are either UUIDs (strings) or unsigned integers.
fn point_id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    result: ScrollResult,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<ScrollPoint>,
    #[serde(default)]
    next_page_offset: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ScrollPoint {
    id: Value,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
