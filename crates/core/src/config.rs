//! Layered Configuration
//!
//! Settings for the orchestrator core, loaded from built-in defaults merged
//! with `switchboard.toml` and `SWITCHBOARD_*` environment variables
//! (nested keys separated by `__`, e.g. `SWITCHBOARD_OLLAMA__BASE_URL`).
//!
//! The router constants are observable behavior, not incidental detail:
//! they default to the exact values the escalation algorithm was tuned for
//! and are covered by regression tests.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Top-level settings for the orchestrator core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ollama: OllamaConfig,
    pub qdrant: QdrantConfig,
    pub rag: RagConfig,
    pub router: RouterConfig,
}

impl Settings {
    /// Load settings from defaults, `switchboard.toml`, and the environment.
    pub fn load() -> CoreResult<Self> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("switchboard.toml"))
            .merge(Env::prefixed("SWITCHBOARD_").split("__"))
            .extract()
            .map_err(|e| CoreError::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the merged settings, returning the first problem found.
    pub fn validate(&self) -> CoreResult<()> {
        self.ollama.validate()?;
        self.qdrant.validate()?;
        self.rag.validate()?;
        self.router.validate()
    }
}

// ---------------------------------------------------------------------------
// Generation/embedding backend
// ---------------------------------------------------------------------------

/// Connection settings for the Ollama backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model used for generation and chat completions.
    pub chat_model: String,
    /// Model used for embedding requests.
    pub embed_model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Default completion budget when the caller does not override it.
    pub max_tokens: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2:8b".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            timeout_secs: 120,
            max_tokens: 4096,
        }
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CoreError::config(format!(
                "ollama.base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.chat_model.trim().is_empty() {
            return Err(CoreError::config("ollama.chat_model must not be empty"));
        }
        if self.embed_model.trim().is_empty() {
            return Err(CoreError::config("ollama.embed_model must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::config("ollama.timeout_secs must be at least 1"));
        }
        if self.max_tokens == 0 {
            return Err(CoreError::config("ollama.max_tokens must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Vector store backend
// ---------------------------------------------------------------------------

/// Connection settings for the Qdrant vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant REST API.
    pub url: String,
    /// API key, sent as the `api-key` header when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Collection holding the indexed document chunks.
    pub collection: String,
    /// Dimensionality of the embedding vectors stored in the collection.
    /// Must match the configured embedding model.
    pub embedding_dim: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "switchboard_docs".to_string(),
            embedding_dim: 768,
            timeout_secs: 30,
        }
    }
}

impl QdrantConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(CoreError::config(format!(
                "qdrant.url must be an http(s) URL, got {:?}",
                self.url
            )));
        }
        if self.collection.trim().is_empty() {
            return Err(CoreError::config("qdrant.collection must not be empty"));
        }
        if self.embedding_dim == 0 {
            return Err(CoreError::config("qdrant.embedding_dim must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::config("qdrant.timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RAG pipeline
// ---------------------------------------------------------------------------

/// Retrieval and chunking parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Default number of chunks retrieved per query.
    pub top_k: usize,
    /// Minimum cosine similarity for a hit to be returned.
    pub score_threshold: f32,
    /// Maximum chunk length, in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks, in characters.
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            score_threshold: 0.7,
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

impl RagConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.top_k == 0 {
            return Err(CoreError::config("rag.top_k must be at least 1"));
        }
        if !(-1.0..=1.0).contains(&self.score_threshold) {
            return Err(CoreError::config(
                "rag.score_threshold must be a cosine similarity in [-1, 1]",
            ));
        }
        if self.chunk_size == 0 {
            return Err(CoreError::config("rag.chunk_size must be at least 1"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(CoreError::config(
                "rag.chunk_overlap must be smaller than rag.chunk_size",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Escalation constants for the intent router.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Confidence contributed by each pattern hit on a single-category match.
    pub per_hit_confidence: f64,
    /// Upper bound on pattern-derived confidence.
    pub confidence_cap: f64,
    /// A top raw score must exceed `margin × second` to win outright.
    pub clear_winner_margin: f64,
    /// Confidence when the caller forces a handler.
    pub forced_confidence: f64,
    /// Confidence for a clear multi-category winner.
    pub clear_winner_confidence: f64,
    /// Confidence when the fallback classifier names the handler.
    pub llm_confidence: f64,
    /// Confidence when static priority weights resolve a near-tie.
    pub weighted_confidence: f64,
    /// Confidence when everything failed and the chat handler is used.
    pub default_confidence: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            per_hit_confidence: 0.3,
            confidence_cap: 1.0,
            clear_winner_margin: 2.0,
            forced_confidence: 1.0,
            clear_winner_confidence: 0.9,
            llm_confidence: 0.8,
            weighted_confidence: 0.7,
            default_confidence: 0.5,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> CoreResult<()> {
        let confidences = [
            ("router.forced_confidence", self.forced_confidence),
            ("router.clear_winner_confidence", self.clear_winner_confidence),
            ("router.llm_confidence", self.llm_confidence),
            ("router.weighted_confidence", self.weighted_confidence),
            ("router.default_confidence", self.default_confidence),
            ("router.confidence_cap", self.confidence_cap),
        ];
        for (name, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::config(format!("{name} must be in [0, 1]")));
            }
        }
        if self.per_hit_confidence <= 0.0 {
            return Err(CoreError::config(
                "router.per_hit_confidence must be positive",
            ));
        }
        if self.clear_winner_margin < 1.0 {
            return Err(CoreError::config(
                "router.clear_winner_margin must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn default_backend_endpoints() {
        let settings = Settings::default();
        assert_eq!(settings.ollama.base_url, "http://localhost:11434");
        assert_eq!(settings.qdrant.url, "http://localhost:6333");
        assert_eq!(settings.qdrant.collection, "switchboard_docs");
        assert_eq!(settings.qdrant.embedding_dim, 768);
    }

    #[test]
    fn default_rag_parameters() {
        let rag = RagConfig::default();
        assert_eq!(rag.top_k, 5);
        assert_eq!(rag.chunk_size, 512);
        assert_eq!(rag.chunk_overlap, 50);
        assert!((rag.score_threshold - 0.7).abs() < f32::EPSILON);
    }

    // The router constants define observable behavior. If one of these
    // assertions fails, routing confidence changed for every caller.
    #[test]
    fn default_router_constants() {
        let router = RouterConfig::default();
        assert_eq!(router.per_hit_confidence, 0.3);
        assert_eq!(router.confidence_cap, 1.0);
        assert_eq!(router.clear_winner_margin, 2.0);
        assert_eq!(router.forced_confidence, 1.0);
        assert_eq!(router.clear_winner_confidence, 0.9);
        assert_eq!(router.llm_confidence, 0.8);
        assert_eq!(router.weighted_confidence, 0.7);
        assert_eq!(router.default_confidence, 0.5);
    }

    #[test]
    fn rejects_non_http_urls() {
        let mut settings = Settings::default();
        settings.ollama.base_url = "localhost:11434".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let mut rag = RagConfig::default();
        rag.chunk_overlap = rag.chunk_size;
        assert!(rag.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let mut router = RouterConfig::default();
        router.llm_confidence = 1.5;
        assert!(router.validate().is_err());
    }

    #[test]
    fn rejects_sub_unit_margin() {
        let mut router = RouterConfig::default();
        router.clear_winner_margin = 0.5;
        assert!(router.validate().is_err());
    }

    #[test]
    fn toml_fragment_overrides_defaults() {
        let fragment = r#"
            [rag]
            top_k = 8

            [ollama]
            chat_model = "qwen2.5:14b"
        "#;
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::string(fragment))
            .extract()
            .unwrap();
        assert_eq!(settings.rag.top_k, 8);
        assert_eq!(settings.ollama.chat_model, "qwen2.5:14b");
        // Untouched sections keep their defaults.
        assert_eq!(settings.qdrant.embedding_dim, 768);
    }
}
