use std::sync::Arc;
use std::time::Duration;

use echorag_core::traits::Reranker;
use echorag_core::RetrievalProfile;

use crate::filters::Scored;

/// Score the first `profile.rerank.candidates` hits, re-sort them by that
/// score and keep `min(top_n, top_k)`. Any failure or timeout falls back to
/// plain truncation of the incoming order to `top_k`.
pub async fn rerank_stage(
    question: &str,
    mut hits: Vec<Scored>,
    reranker: Option<&Arc<dyn Reranker>>,
    profile: &RetrievalProfile,
    timeout: Duration,
) -> Vec<Scored> {
    let Some(reranker) = reranker else {
        hits.truncate(profile.top_k);
        return hits;
    };
    hits.truncate(profile.rerank.candidates);
    let texts: Vec<String> = hits.iter().map(|s| s.hit.text.clone()).collect();
    let scores = match tokio::time::timeout(timeout, reranker.score(question, &texts)).await {
        Ok(Ok(scores)) if scores.len() == hits.len() => scores,
        Ok(Ok(scores)) => {
            tracing::warn!(expected = hits.len(), got = scores.len(), "rerank returned wrong count, skipping");
            hits.truncate(profile.top_k);
            return hits;
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "rerank failed, keeping fused order");
            hits.truncate(profile.top_k);
            return hits;
        }
        Err(_) => {
            tracing::warn!("rerank timed out, keeping fused order");
            hits.truncate(profile.top_k);
            return hits;
        }
    };
    for (s, score) in hits.iter_mut().zip(scores) {
        s.hit.rerank_score = Some(score.clamp(0.0, 10.0));
    }
    hits.sort_by(|a, b| {
        let (x, y) = (a.hit.rerank_score.unwrap_or(0.0), b.hit.rerank_score.unwrap_or(0.0));
        y.total_cmp(&x)
    });
    hits.truncate(profile.rerank.top_n.min(profile.top_k));
    hits
}

/// Rerank score over 10 when present, else best dense similarity or any
/// sparse match.
pub fn passes_relevance(s: &Scored, threshold: f32) -> bool {
    match s.hit.rerank_score {
        Some(score) => score / 10.0 >= threshold,
        None => s.hit.sparse_match || s.hit.dense_similarity.is_some_and(|d| d >= threshold),
    }
}
