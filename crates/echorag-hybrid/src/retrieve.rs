use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use echorag_core::traits::{ChunkStore, Compressor, IntentClassifier, QueryRewriter, Reranker};
use echorag_core::{Document, Hit, Intent, RetrievalError, RetrievalProfile};
use echorag_text::tokenize;

use crate::context::{ContextAssembler, ContextBlock};
use crate::expand::{is_general_conversation, Expansion, QueryExpander};
use crate::filters::{apply_filters, FilterCtx, Scored};
use crate::fuse::{rrf_fuse, Fused};
use crate::options::{ContextOptions, RetrievalOptions, TimeWindow};
use crate::rerank::{passes_relevance, rerank_stage};
use crate::search::HybridSearcher;
use crate::writer::Backends;

/// What a caller can say when retrieval finds nothing relevant enough.
pub const INSUFFICIENT_CONTEXT_MSG: &str =
    "The available documents do not contain enough information to answer that question.";

const HYDRATE_RETRY_DELAY: Duration = Duration::from_millis(25);

/// Optional external collaborators. Each is only used when the matching
/// option flag is on.
#[derive(Clone, Default)]
pub struct OptionalStages {
    pub classifier: Option<Arc<dyn IntentClassifier>>,
    pub rewriter: Option<Arc<dyn QueryRewriter>>,
    pub compressor: Option<Arc<dyn Compressor>>,
    pub reranker: Option<Arc<dyn Reranker>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RetrievalResult {
    pub hits: Vec<Hit>,
    pub intent: Intent,
    pub queries: Vec<String>,
    pub profile: RetrievalProfile,
}

impl RetrievalResult {
    /// An empty result is a valid outcome, see [`INSUFFICIENT_CONTEXT_MSG`].
    pub fn has_relevant_content(&self) -> bool {
        !self.hits.is_empty()
    }
}

pub struct Retriever {
    store: Arc<dyn ChunkStore>,
    searcher: HybridSearcher,
    expander: QueryExpander,
    reranker: Option<Arc<dyn Reranker>>,
    context: ContextAssembler,
    opts: RetrievalOptions,
}

impl Retriever {
    pub fn new(backends: Backends, stages: OptionalStages, opts: RetrievalOptions, context_opts: ContextOptions) -> Self {
        let searcher = HybridSearcher::new(
            backends.embedder,
            backends.dense,
            backends.sparse,
            opts.embed_timeout,
            opts.fan_in_timeout,
        );
        let expander = QueryExpander::new(
            stages.classifier.filter(|_| opts.llm_intent),
            stages.rewriter.filter(|_| opts.query_rewrite),
            opts.stage_timeout,
        );
        let compressor = stages.compressor.filter(|_| context_opts.compress);
        Self {
            context: ContextAssembler::new(backends.store.clone(), compressor, context_opts),
            store: backends.store,
            searcher,
            expander,
            reranker: stages.reranker.filter(|_| opts.rerank),
            opts,
        }
    }

    pub fn options(&self) -> &RetrievalOptions {
        &self.opts
    }

    /// Ranked, filtered and relevance-gated hits for `question`. `k`
    /// defaults to the configured `default_k`.
    pub async fn retrieve(
        &self,
        question: &str,
        k: Option<usize>,
        window: TimeWindow,
    ) -> Result<RetrievalResult, RetrievalError> {
        self.retrieve_at(question, k, window, Utc::now()).await
    }

    /// [`Retriever::retrieve`] with the clock fixed at `now`.
    pub async fn retrieve_at(
        &self,
        question: &str,
        k: Option<usize>,
        window: TimeWindow,
        now: DateTime<Utc>,
    ) -> Result<RetrievalResult, RetrievalError> {
        let k = k.unwrap_or(self.opts.default_k).max(1);
        if is_general_conversation(question) {
            tracing::debug!("general conversation, skipping retrieval");
            return Ok(RetrievalResult {
                hits: Vec::new(),
                intent: Intent::Exploratory,
                queries: Vec::new(),
                profile: RetrievalProfile::for_intent(Intent::Exploratory, k),
            });
        }

        let Expansion { intent, queries } = self.expander.expand(question).await;
        let profile = RetrievalProfile::for_intent(intent, k);
        let lists = self.searcher.search(&queries, profile.k_per_query).await?;
        let fused = rrf_fuse(&lists, profile.dense_weight, profile.sparse_weight, self.opts.rrf_k);
        let fused_count = fused.len();
        let hydrated = self.hydrate(fused).await?;

        let ctx = FilterCtx {
            question_tokens: tokenize(question).into_iter().collect(),
            now,
            window,
            opts: &self.opts,
            store: self.store.as_ref(),
        };
        let filtered = apply_filters(hydrated, &ctx);
        let ranked =
            rerank_stage(question, filtered, self.reranker.as_ref(), &profile, self.opts.stage_timeout).await;
        let before_gate = ranked.len();
        let hits: Vec<Hit> = ranked
            .into_iter()
            .filter(|s| !self.opts.relevance_gate || passes_relevance(s, profile.relevance_threshold))
            .map(|s| s.hit)
            .collect();

        tracing::info!(
            intent = %intent,
            queries = queries.len(),
            fused = fused_count,
            ranked = before_gate,
            returned = hits.len(),
            "retrieval done"
        );
        Ok(RetrievalResult { hits, intent, queries, profile })
    }

    /// Look up chunk text and document metadata for fused results. A chunk
    /// missing from the store is retried once and then dropped.
    async fn hydrate(&self, fused: Vec<Fused>) -> Result<Vec<Scored>, RetrievalError> {
        let mut docs: HashMap<String, Option<Arc<Document>>> = HashMap::new();
        let mut out = Vec::with_capacity(fused.len());
        for f in fused {
            let chunk = match self.load_chunk(&f.chunk_id)? {
                Some(c) => Some(c),
                None => {
                    tokio::time::sleep(HYDRATE_RETRY_DELAY).await;
                    self.load_chunk(&f.chunk_id)?
                }
            };
            let Some(chunk) = chunk else {
                tracing::debug!(chunk_id = %f.chunk_id, "indexed chunk not in store, dropped");
                continue;
            };
            if chunk.is_parent {
                continue;
            }
            let doc = match docs.get(&chunk.doc_id) {
                Some(d) => d.clone(),
                None => {
                    let d = self
                        .store
                        .get_document(&chunk.doc_id)
                        .map_err(|e| RetrievalError::Store(format!("{e:#}")))?
                        .map(Arc::new);
                    docs.insert(chunk.doc_id.clone(), d.clone());
                    d
                }
            };
            let Some(doc) = doc else {
                continue;
            };
            out.push(Scored {
                hit: Hit {
                    chunk_id: chunk.chunk_id.clone(),
                    score: f.score,
                    source: chunk.to_source(&doc.filename, &doc.filetype),
                    text: chunk.text,
                    dense_similarity: f.best_dense,
                    sparse_match: f.sparse_match,
                    rerank_score: None,
                },
                doc,
            });
        }
        Ok(out)
    }

    fn load_chunk(&self, chunk_id: &str) -> Result<Option<echorag_core::Chunk>, RetrievalError> {
        self.store.get_chunk(chunk_id).map_err(|e| RetrievalError::Store(format!("{e:#}")))
    }

    /// Context blocks for the generation step, in hit order.
    pub async fn build_context(&self, question: &str, hits: &[Hit]) -> Vec<ContextBlock> {
        self.context.build(question, hits).await
    }
}
