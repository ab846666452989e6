//! Per-variant dense and sparse lookups against one pinned snapshot.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use echorag_core::traits::{DenseIndex, DenseSnapshot, Embedder, SparseIndex, SparseSnapshot};
use echorag_core::{RetrievalError, SourceKind};
use echorag_embed::{l2_normalize, truncate_at_word_boundary};
use echorag_text::tokenize;

use crate::fuse::RankedList;

pub struct HybridSearcher {
    embedder: Arc<dyn Embedder>,
    dense: Arc<dyn DenseIndex>,
    sparse: Arc<dyn SparseIndex>,
    embed_timeout: Duration,
    fan_in_timeout: Duration,
}

impl HybridSearcher {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        dense: Arc<dyn DenseIndex>,
        sparse: Arc<dyn SparseIndex>,
        embed_timeout: Duration,
        fan_in_timeout: Duration,
    ) -> Self {
        Self { embedder, dense, sparse, embed_timeout, fan_in_timeout }
    }

    /// Dense and sparse top-`k` lists for every query. `queries[0]` is the
    /// question itself: failing to embed it is [`RetrievalError::Unavailable`].
    /// Variants that fail or miss the fan-in deadline are skipped.
    pub async fn search(&self, queries: &[String], k: usize) -> Result<Vec<RankedList>, RetrievalError> {
        let Some(question) = queries.first() else {
            return Ok(Vec::new());
        };
        let dense_snap = self
            .dense
            .snapshot()
            .await
            .map_err(|e| RetrievalError::Index(format!("dense snapshot: {e:#}")))?;
        let sparse_snap =
            self.sparse.snapshot().map_err(|e| RetrievalError::Index(format!("sparse snapshot: {e:#}")))?;

        let question_vec = self.embed_question(question).await?;
        let variant_vecs = self.embed_variants(&queries[1..]).await;

        let lookups = queries.iter().enumerate().map(|(i, q)| {
            let vector = if i == 0 { Some(question_vec.clone()) } else { variant_vecs.get(i - 1).cloned().flatten() };
            let dense_snap = dense_snap.clone();
            let sparse_snap = sparse_snap.clone();
            let tokens = tokenize(q);
            async move {
                let call = lookup(dense_snap, sparse_snap, vector, tokens, k);
                match tokio::time::timeout(self.fan_in_timeout, call).await {
                    Ok(lists) => lists,
                    Err(_) => {
                        tracing::warn!(variant = i, "variant lookup missed the fan-in deadline");
                        Vec::new()
                    }
                }
            }
        });
        let lists: Vec<RankedList> = join_all(lookups).await.into_iter().flatten().collect();
        tracing::debug!(queries = queries.len(), lists = lists.len(), "hybrid search done");
        Ok(lists)
    }

    async fn embed_question(&self, question: &str) -> Result<Vec<f32>, RetrievalError> {
        let text = truncate_at_word_boundary(question, self.embedder.max_input_chars()).to_string();
        let call = self.embedder.embed_batch(std::slice::from_ref(&text));
        let mut vectors = match tokio::time::timeout(self.embed_timeout, call).await {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => return Err(RetrievalError::Unavailable(format!("question embedding failed: {e:#}"))),
            Err(_) => {
                return Err(RetrievalError::Unavailable(format!(
                    "question embedding timed out after {:?}",
                    self.embed_timeout
                )))
            }
        };
        let mut vector =
            vectors.pop().ok_or_else(|| RetrievalError::Unavailable("embedder returned no vector".to_string()))?;
        l2_normalize(&mut vector);
        Ok(vector)
    }

    /// Variant vectors in order; `None` for all of them when the batch fails.
    async fn embed_variants(&self, variants: &[String]) -> Vec<Option<Vec<f32>>> {
        if variants.is_empty() {
            return Vec::new();
        }
        let max = self.embedder.max_input_chars();
        let texts: Vec<String> = variants.iter().map(|v| truncate_at_word_boundary(v, max).to_string()).collect();
        match tokio::time::timeout(self.embed_timeout, self.embedder.embed_batch(&texts)).await {
            Ok(Ok(vectors)) if vectors.len() == texts.len() => vectors
                .into_iter()
                .map(|mut v| {
                    l2_normalize(&mut v);
                    Some(v)
                })
                .collect(),
            _ => {
                tracing::warn!(variants = variants.len(), "variant embedding failed, sparse only for variants");
                vec![None; variants.len()]
            }
        }
    }
}

async fn lookup(
    dense: Arc<dyn DenseSnapshot>,
    sparse: Arc<dyn SparseSnapshot>,
    vector: Option<Vec<f32>>,
    tokens: Vec<String>,
    k: usize,
) -> Vec<RankedList> {
    let mut out = Vec::with_capacity(2);
    if let Some(vector) = vector {
        match dense.search(&vector, k).await {
            Ok(hits) => out.push(RankedList { kind: SourceKind::Dense, hits }),
            Err(e) => tracing::warn!(error = %e, "dense lookup failed"),
        }
    }
    match sparse.search(&tokens, k) {
        Ok(hits) => out.push(RankedList { kind: SourceKind::Sparse, hits }),
        Err(e) => tracing::warn!(error = %e, "sparse lookup failed"),
    }
    out
}
