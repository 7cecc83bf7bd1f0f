//! Application Context
//!
//! Explicit, constructed-once dependency container replacing module-level
//! client singletons. Construction order: generation/embedding client,
//! vector store client, RAG pipeline, router. `shutdown` releases
//! components in the reverse order.
//!
//! The backend clients are built eagerly but open no connections until
//! first use, so constructing a context is cheap and infallible with
//! respect to the network.

use std::sync::Arc;

use switchboard_core::Settings;
use switchboard_llm::OllamaProvider;
use switchboard_rag::{QdrantStore, RagPipeline};

use crate::router::Router;

/// Shared handles to every component of the orchestrator core.
pub struct AppContext {
    settings: Settings,
    llm: Arc<OllamaProvider>,
    store: Arc<QdrantStore>,
    rag: Arc<RagPipeline>,
    router: Arc<Router>,
}

impl AppContext {
    /// Build the full component graph from validated settings.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let llm = Arc::new(OllamaProvider::new(&settings.ollama)?);
        let store = Arc::new(QdrantStore::new(&settings.qdrant)?);
        let rag = Arc::new(RagPipeline::new(
            llm.clone(),
            llm.clone(),
            store.clone(),
            settings.rag.clone(),
        ));
        let router = Arc::new(Router::new(llm.clone(), settings.router.clone()));

        tracing::info!(
            "orchestrator context ready (ollama={}, qdrant={})",
            settings.ollama.base_url,
            settings.qdrant.url
        );
        Ok(Self {
            settings,
            llm,
            store,
            rag,
            router,
        })
    }

    /// Build a context from layered configuration (defaults, toml, env).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(Settings::load()?)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn llm(&self) -> &Arc<OllamaProvider> {
        &self.llm
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn rag(&self) -> &Arc<RagPipeline> {
        &self.rag
    }

    /// Tear the context down in reverse construction order.
    ///
    /// The HTTP clients close their pooled connections when the last
    /// handle drops; callers holding cloned `Arc`s keep their component
    /// alive until those clones drop too.
    pub fn shutdown(self) {
        let Self {
            settings: _,
            llm,
            store,
            rag,
            router,
        } = self;
        drop(router);
        tracing::debug!("router released");
        drop(rag);
        tracing::debug!("rag pipeline released");
        drop(store);
        tracing::debug!("vector store client released");
        drop(llm);
        tracing::debug!("llm client released");
        tracing::info!("orchestrator context shut down");
    }
}
