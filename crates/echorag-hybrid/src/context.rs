//! Ordered context blocks for the generation step.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use echorag_chunk::segment;
use echorag_core::traits::{ChunkStore, Compressor};
use echorag_core::{ChunkId, ChunkSource, Hit};
use echorag_embed::truncate_at_word_boundary;

use crate::options::ContextOptions;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Parent,
    Hit,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContextBlock {
    pub kind: BlockKind,
    pub chunk_id: ChunkId,
    pub text: String,
    pub source: ChunkSource,
}

pub struct ContextAssembler {
    store: Arc<dyn ChunkStore>,
    compressor: Option<Arc<dyn Compressor>>,
    opts: ContextOptions,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn ChunkStore>, compressor: Option<Arc<dyn Compressor>>, opts: ContextOptions) -> Self {
        Self { store, compressor, opts }
    }

    /// Parent (once per answer, truncated) before each child hit, then the
    /// hit itself, then sentence dedupe across all blocks.
    pub async fn build(&self, question: &str, hits: &[Hit]) -> Vec<ContextBlock> {
        let mut emitted_parents: HashSet<&str> = HashSet::new();
        let mut blocks = Vec::with_capacity(hits.len() * 2);
        for hit in hits {
            if let Some(parent_id) = hit.source.parent_chunk_id.as_deref() {
                if emitted_parents.insert(parent_id) {
                    if let Some(block) = self.parent_block(parent_id, hit) {
                        blocks.push(block);
                    }
                }
            }
            let text = self.maybe_compress(question, &hit.text).await;
            blocks.push(ContextBlock {
                kind: BlockKind::Hit,
                chunk_id: hit.chunk_id.clone(),
                text,
                source: hit.source.clone(),
            });
        }
        match self.opts.dedupe_threshold {
            Some(threshold) => dedupe_sentences(blocks, threshold),
            None => blocks,
        }
    }

    fn parent_block(&self, parent_id: &str, child: &Hit) -> Option<ContextBlock> {
        let parent = match self.store.get_chunk(parent_id) {
            Ok(Some(p)) => p,
            Ok(None) => {
                tracing::warn!(parent_id, "parent chunk missing from store");
                return None;
            }
            Err(e) => {
                tracing::warn!(parent_id, error = %e, "parent chunk lookup failed");
                return None;
            }
        };
        let text = truncate_at_word_boundary(&parent.text, self.opts.parent_max_chars).to_string();
        Some(ContextBlock {
            kind: BlockKind::Parent,
            source: parent.to_source(&child.source.filename, &child.source.filetype),
            chunk_id: parent.chunk_id,
            text,
        })
    }

    async fn maybe_compress(&self, question: &str, text: &str) -> String {
        let Some(compressor) = self.compressor.as_ref().filter(|_| self.opts.compress) else {
            return text.to_string();
        };
        match tokio::time::timeout(self.opts.compress_timeout, compressor.compress(question, text)).await {
            Ok(Ok(short)) if !short.trim().is_empty() => short,
            Ok(Ok(_)) => text.to_string(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "compression failed, using full text");
                text.to_string()
            }
            Err(_) => {
                tracing::warn!("compression timed out, using full text");
                text.to_string()
            }
        }
    }
}

fn word_set(sentence: &str) -> HashSet<String> {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}

/// Left to right, drop every sentence whose word-set Jaccard similarity to
/// an already kept sentence reaches `threshold`. Blocks left empty vanish.
pub fn dedupe_sentences(blocks: Vec<ContextBlock>, threshold: f64) -> Vec<ContextBlock> {
    let mut kept: Vec<HashSet<String>> = Vec::new();
    let mut out = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        let mut sentences = Vec::new();
        for sentence in segment(&block.text) {
            let words = word_set(sentence);
            if words.is_empty() || kept.iter().any(|k| jaccard(k, &words) >= threshold) {
                continue;
            }
            kept.push(words);
            sentences.push(sentence);
        }
        if sentences.is_empty() {
            continue;
        }
        block.text = sentences.join(" ");
        out.push(block);
    }
    out
}
