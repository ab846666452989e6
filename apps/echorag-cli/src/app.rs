use anyhow::{Context, Result};
use std::sync::Arc;

use echorag_core::Settings;
use echorag_embed::get_default_embedder;
use echorag_hybrid::{Backends, ContextOptions, Ingestor, OptionalStages, RetrievalOptions, Retriever, RetryPolicy};
use echorag_llm::{ChatClient, LlmStages};
use echorag_store::SqliteStore;
use echorag_text::TantivySparseIndex;
use echorag_vector::LanceDenseIndex;

/// Opened backends plus the settings they were opened with.
pub struct App {
    pub settings: Settings,
    backends: Backends,
}

impl App {
    pub async fn open(settings: Settings) -> Result<Self> {
        let data = &settings.data;
        let embedder = get_default_embedder(&settings.embedding)?;
        let dense = LanceDenseIndex::open(&data.lancedb_dir, &data.table, embedder.dim())
            .await
            .context("open dense index")?;
        let sparse = TantivySparseIndex::open(&data.tantivy_dir).context("open sparse index")?;
        let store = SqliteStore::open(&data.sqlite_path).context("open document store")?;
        tracing::debug!(
            sqlite = %data.sqlite_path.display(),
            tantivy = %data.tantivy_dir.display(),
            lancedb = %data.lancedb_dir.display(),
            "opened backends"
        );
        let backends = Backends { embedder, dense: Arc::new(dense), sparse: Arc::new(sparse), store: Arc::new(store) };
        Ok(Self { settings, backends })
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.backends.clone(), RetryPolicy::from(&self.settings.embedding))
    }

    pub fn retriever(&self) -> Result<Retriever> {
        Ok(Retriever::new(
            self.backends.clone(),
            self.optional_stages()?,
            RetrievalOptions::from(&self.settings),
            ContextOptions::from(&self.settings),
        ))
    }

    /// The chat client is only built when some stage needs it.
    fn optional_stages(&self) -> Result<OptionalStages> {
        let r = &self.settings.retrieval;
        if !(r.llm_intent || r.query_rewrite || r.rerank || self.settings.context.compress) {
            return Ok(OptionalStages::default());
        }
        let chat = ChatClient::new(&self.settings.llm)?;
        tracing::info!(endpoint = chat.endpoint(), "llm stages enabled");
        let llm = LlmStages::new(Arc::new(chat));
        Ok(OptionalStages {
            classifier: Some(llm.classifier),
            rewriter: Some(llm.rewriter),
            compressor: Some(llm.compressor),
            reranker: Some(llm.reranker),
        })
    }
}
