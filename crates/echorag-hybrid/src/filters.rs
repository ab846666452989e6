//! Post-rank filters, applied in a fixed order as `(enabled, filter)` pairs.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use echorag_chunk::extract_headings;
use echorag_core::traits::ChunkStore;
use echorag_core::{Document, Hit};
use echorag_text::tokenize;

use crate::options::{RetrievalOptions, TimeWindow};

/// A hydrated hit together with its owning document.
#[derive(Debug, Clone)]
pub struct Scored {
    pub hit: Hit,
    pub doc: Arc<Document>,
}

impl Scored {
    pub fn is_transcript(&self) -> bool {
        self.doc.is_transcript()
    }
}

/// Everything a filter may read. Filters never call external services.
pub struct FilterCtx<'a> {
    pub question_tokens: HashSet<String>,
    pub now: DateTime<Utc>,
    pub window: TimeWindow,
    pub opts: &'a RetrievalOptions,
    pub store: &'a dyn ChunkStore,
}

pub type Filter = fn(Vec<Scored>, &FilterCtx<'_>) -> Vec<Scored>;

/// The synchronous stages in application order.
pub fn post_rank_filters(ctx: &FilterCtx<'_>) -> [(bool, &'static str, Filter); 5] {
    [
        (ctx.window != TimeWindow::All, "time_window", time_window),
        (ctx.opts.decay.is_some(), "recency_decay", recency_decay),
        (ctx.opts.tag_boost.is_some(), "tag_boost", tag_boost),
        (true, "authoritative", authoritative_sort),
        (ctx.opts.adjacent_expansion, "adjacent_expansion", adjacent_expansion),
    ]
}

pub fn apply_filters(mut hits: Vec<Scored>, ctx: &FilterCtx<'_>) -> Vec<Scored> {
    for (enabled, name, filter) in post_rank_filters(ctx) {
        if enabled {
            let before = hits.len();
            hits = filter(hits, ctx);
            tracing::debug!(filter = name, before, after = hits.len(), "post-rank filter");
        }
    }
    hits
}

pub fn time_window(hits: Vec<Scored>, ctx: &FilterCtx<'_>) -> Vec<Scored> {
    hits.into_iter().filter(|s| ctx.window.contains(s.doc.created_at, ctx.now)).collect()
}

fn age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let secs = now.signed_duration_since(created_at).num_seconds().max(0) as f64;
    secs / 86_400.0
}

/// `max(exp(-age/halflife), min_factor)`.
pub fn decay_factor(age_days: f64, halflife_days: f64, min_factor: f64) -> f64 {
    if halflife_days <= 0.0 {
        return 1.0;
    }
    (-age_days / halflife_days).exp().max(min_factor)
}

pub fn recency_decay(mut hits: Vec<Scored>, ctx: &FilterCtx<'_>) -> Vec<Scored> {
    let Some(params) = ctx.opts.decay else {
        return hits;
    };
    for s in &mut hits {
        let age = age_days(s.doc.created_at, ctx.now);
        s.hit.score *= decay_factor(age, params.halflife_days, params.min_factor);
    }
    hits
}

/// Number of distinct tag tokens that also occur in the question.
pub fn tag_overlap(tags: &[String], question_tokens: &HashSet<String>) -> usize {
    let tag_tokens: HashSet<String> = tags.iter().flat_map(|t| tokenize(t)).collect();
    tag_tokens.intersection(question_tokens).count()
}

/// Transcripts only: `score *= 1 + min(factor * overlap, max_boost)`.
pub fn tag_boost(mut hits: Vec<Scored>, ctx: &FilterCtx<'_>) -> Vec<Scored> {
    let Some(params) = ctx.opts.tag_boost else {
        return hits;
    };
    for s in &mut hits {
        if !s.is_transcript() {
            continue;
        }
        let tags = s.doc.tags();
        if tags.is_empty() {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let overlap = tag_overlap(&tags, &ctx.question_tokens) as f64;
        s.hit.score *= 1.0 + (params.factor * overlap).min(params.max_boost);
    }
    hits
}

/// Score descending; within a run of scores no further than `tie_epsilon`
/// from the run's first score, non-transcript hits come first.
pub fn authoritative_sort(mut hits: Vec<Scored>, ctx: &FilterCtx<'_>) -> Vec<Scored> {
    hits.sort_by(|a, b| b.hit.score.total_cmp(&a.hit.score));
    let eps = ctx.opts.tie_epsilon;
    let mut start = 0;
    while start < hits.len() {
        let head = hits[start].hit.score;
        let mut end = start + 1;
        while end < hits.len() && (head - hits[end].hit.score).abs() <= eps {
            end += 1;
        }
        hits[start..end].sort_by_key(Scored::is_transcript);
        start = end;
    }
    hits
}

static TOC_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:table of contents|contents)\b").ok());

static NUMBERED_DIVISION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:chapter|part|section)\s+(?:\d+|[ivxlc]+)\b").ok());

/// Text that looks like a table of contents or a run of headings.
pub fn has_toc_signal(text: &str) -> bool {
    if TOC_MARKER.as_ref().is_some_and(|re| re.is_match(text)) {
        return true;
    }
    if NUMBERED_DIVISION.as_ref().is_some_and(|re| re.find_iter(text).count() >= 2) {
        return true;
    }
    extract_headings(text).len() >= 2
}

/// For every hit with a table-of-contents signal, add its non-parent
/// neighbours (`chunk_index - 1` and `+ 1`) right after it. Neighbours carry
/// the anchor's score and relevance signals.
pub fn adjacent_expansion(hits: Vec<Scored>, ctx: &FilterCtx<'_>) -> Vec<Scored> {
    let mut seen: HashSet<String> = hits.iter().map(|s| s.hit.chunk_id.clone()).collect();
    let mut out = Vec::with_capacity(hits.len());
    for anchor in hits {
        let neighbours = if has_toc_signal(&anchor.hit.text) { neighbours_of(&anchor, ctx) } else { Vec::new() };
        out.push(anchor);
        for n in neighbours {
            if seen.insert(n.hit.chunk_id.clone()) {
                out.push(n);
            }
        }
    }
    out
}

fn neighbours_of(anchor: &Scored, ctx: &FilterCtx<'_>) -> Vec<Scored> {
    let src = &anchor.hit.source;
    let mut indexes = Vec::with_capacity(2);
    if let Some(prev) = src.chunk_index.checked_sub(1) {
        indexes.push(prev);
    }
    indexes.push(src.chunk_index + 1);

    let mut out = Vec::new();
    for idx in indexes {
        match ctx.store.chunk_at(&src.doc_id, idx) {
            Ok(Some(chunk)) if !chunk.is_parent => out.push(Scored {
                hit: Hit {
                    chunk_id: chunk.chunk_id.clone(),
                    score: anchor.hit.score,
                    source: chunk.to_source(&anchor.doc.filename, &anchor.doc.filetype),
                    text: chunk.text,
                    dense_similarity: anchor.hit.dense_similarity,
                    sparse_match: anchor.hit.sparse_match,
                    rerank_score: None,
                },
                doc: anchor.doc.clone(),
            }),
            Ok(_) => {}
            Err(e) => tracing::warn!(doc_id = %src.doc_id, idx, error = %e, "adjacent chunk lookup failed"),
        }
    }
    out
}
