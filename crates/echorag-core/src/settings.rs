//! Typed settings tree. Every field has a default so an empty `config.toml`
//! (or none at all) yields a working local setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::resolve_with_base;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub context: ContextSettings,
}

impl Settings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.embedding.dim == 0 {
            anyhow::bail!("embedding.dim must be positive");
        }
        if self.embedding.max_attempts == 0 {
            anyhow::bail!("embedding.max_attempts must be at least 1");
        }
        if self.retrieval.default_k == 0 {
            anyhow::bail!("retrieval.default_k must be positive");
        }
        if !(0.0..=1.0).contains(&self.retrieval.min_decay_factor) {
            anyhow::bail!("retrieval.min_decay_factor must be within [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.retrieval.max_tag_boost) {
            anyhow::bail!("retrieval.max_tag_boost must be within [0, 1]");
        }
        if self.retrieval.halflife_days <= 0.0 {
            anyhow::bail!("retrieval.halflife_days must be positive");
        }
        if !(0.0..=1.0).contains(&self.context.dedupe_threshold) {
            anyhow::bail!("context.dedupe_threshold must be within [0, 1]");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    pub sqlite_path: PathBuf,
    pub tantivy_dir: PathBuf,
    pub lancedb_dir: PathBuf,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/echorag.sqlite"),
            tantivy_dir: PathBuf::from("data/index/tantivy"),
            lancedb_dir: PathBuf::from("data/index/lancedb"),
            table: "chunks".to_string(),
        }
    }
}

impl DataSettings {
    pub fn resolve_paths(&mut self, base: &Path) {
        self.sqlite_path = resolve_with_base(base, self.sqlite_path.to_string_lossy());
        self.tantivy_dir = resolve_with_base(base, self.tantivy_dir.to_string_lossy());
        self.lancedb_dir = resolve_with_base(base, self.lancedb_dir.to_string_lossy());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub url: String,
    pub model: String,
    pub dim: usize,
    /// Inputs longer than this are cut at a word boundary before embedding.
    pub max_input_chars: usize,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub use_fake: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434/api/embeddings".to_string(),
            model: "nomic-embed-text".to_string(),
            dim: 768,
            max_input_chars: 2048,
            timeout_ms: 30_000,
            max_attempts: 3,
            backoff_ms: 250,
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            timeout_ms: 20_000,
            temperature: 0.0,
            max_tokens: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_k: usize,
    pub rrf_k: f64,
    pub fan_in_timeout_ms: u64,
    pub tie_epsilon: f64,
    pub llm_intent: bool,
    pub query_rewrite: bool,
    pub recency_decay: bool,
    pub halflife_days: f64,
    pub min_decay_factor: f64,
    pub tag_boost: bool,
    pub tag_boost_factor: f64,
    pub max_tag_boost: f64,
    pub adjacent_expansion: bool,
    pub rerank: bool,
    pub relevance_gate: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_k: 8,
            rrf_k: 60.0,
            fan_in_timeout_ms: 5_000,
            tie_epsilon: 1e-6,
            llm_intent: false,
            query_rewrite: false,
            recency_decay: false,
            halflife_days: 30.0,
            min_decay_factor: 0.2,
            tag_boost: true,
            tag_boost_factor: 0.15,
            max_tag_boost: 1.0,
            adjacent_expansion: true,
            rerank: false,
            relevance_gate: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextSettings {
    pub parent_max_chars: usize,
    pub compress: bool,
    pub sentence_dedupe: bool,
    pub dedupe_threshold: f64,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self { parent_max_chars: 2000, compress: false, sentence_dedupe: true, dedupe_threshold: 0.8 }
    }
}
