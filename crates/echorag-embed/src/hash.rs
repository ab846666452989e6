use anyhow::Result;
use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use echorag_core::traits::Embedder;

use crate::l2_normalize;

/// Hashes lowercased word tokens into `dim` buckets. Texts sharing words get
/// a positive inner product; identical texts get identical vectors.
pub struct HashEmbedder {
    dim: usize,
    max_input_chars: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize, max_input_chars: usize) -> Self {
        Self { dim: dim.max(1), max_input_chars }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| t.len() >= 2) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            v[idx] += 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
        }
        l2_normalize(&mut v);
        v
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
