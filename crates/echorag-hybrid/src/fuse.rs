//! Weighted reciprocal rank fusion.

use std::collections::HashMap;

use echorag_core::{ChunkId, SearchHit, SourceKind};

/// One ranked result list from one index for one query variant.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedList {
    pub kind: SourceKind,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fused {
    pub chunk_id: ChunkId,
    pub score: f64,
    /// Best raw inner product across dense lists.
    pub best_dense: Option<f32>,
    pub sparse_match: bool,
}

/// Sum `weight / (k + rank)` (rank from 1) over every list a chunk appears in.
///
/// A chunk repeated within one list only counts at its best rank. Output is
/// sorted by fused score, best first; exact ties keep first-seen order.
pub fn rrf_fuse(lists: &[RankedList], dense_weight: f64, sparse_weight: f64, k: f64) -> Vec<Fused> {
    let mut order: Vec<Fused> = Vec::new();
    let mut pos: HashMap<ChunkId, usize> = HashMap::new();

    for list in lists {
        let weight = match list.kind {
            SourceKind::Dense => dense_weight,
            SourceKind::Sparse => sparse_weight,
        };
        let mut seen_here: Vec<&str> = Vec::with_capacity(list.hits.len());
        for (i, hit) in list.hits.iter().enumerate() {
            if seen_here.contains(&hit.id.as_str()) {
                continue;
            }
            seen_here.push(&hit.id);
            #[allow(clippy::cast_precision_loss)]
            let contribution = weight / (k + (i + 1) as f64);
            let idx = *pos.entry(hit.id.clone()).or_insert_with(|| {
                order.push(Fused { chunk_id: hit.id.clone(), score: 0.0, best_dense: None, sparse_match: false });
                order.len() - 1
            });
            let entry = &mut order[idx];
            entry.score += contribution;
            match list.kind {
                SourceKind::Dense => {
                    entry.best_dense = Some(entry.best_dense.map_or(hit.score, |b| b.max(hit.score)));
                }
                SourceKind::Sparse => entry.sparse_match = true,
            }
        }
    }

    order.sort_by(|a, b| b.score.total_cmp(&a.score));
    order
}
