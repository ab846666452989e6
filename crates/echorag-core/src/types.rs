//! Domain types shared by the chunking, indexing and retrieval crates.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type DocId = String;
pub type ChunkId = String;
pub type Meta = BTreeMap<String, serde_json::Value>;

/// Classifier output; selects the chunking strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Faq,
    LongForm,
    Sensitive,
    Default,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocType::Faq => "faq",
            DocType::LongForm => "long_form",
            DocType::Sensitive => "sensitive",
            DocType::Default => "default",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faq" => Ok(DocType::Faq),
            "long_form" => Ok(DocType::LongForm),
            "sensitive" => Ok(DocType::Sensitive),
            "default" => Ok(DocType::Default),
            other => Err(crate::Error::Operation(format!("unknown doc type '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLevel {
    Low,
    Medium,
    High,
}

impl SensitivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            SensitivityLevel::Low => "low",
            SensitivityLevel::Medium => "medium",
            SensitivityLevel::High => "high",
        }
    }
}

impl FromStr for SensitivityLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(SensitivityLevel::Low),
            "medium" => Ok(SensitivityLevel::Medium),
            "high" => Ok(SensitivityLevel::High),
            other => Err(crate::Error::Operation(format!("unknown sensitivity level '{other}'"))),
        }
    }
}

/// Whether a document's dense and sparse entries are known to be complete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Pending,
    Indexed,
}

impl IndexState {
    pub fn as_str(self) -> &'static str {
        match self {
            IndexState::Pending => "pending",
            IndexState::Indexed => "indexed",
        }
    }
}

/// An ingested source. Immutable once created except for deletion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub filename: String,
    pub filetype: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Meta,
}

impl Document {
    /// Transcripts are stored with a `transcript_` filename prefix or `type = "transcript"`.
    pub fn is_transcript(&self) -> bool {
        self.filename.starts_with("transcript_")
            || self.metadata.get("type").and_then(|v| v.as_str()) == Some("transcript")
    }

    /// Tags from metadata: either a JSON array of strings or a comma separated string.
    pub fn tags(&self) -> Vec<String> {
        match self.metadata.get("tags") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(serde_json::Value::String(s)) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Strategy output before identifiers are minted.
///
/// `parent` is the position of this draft's parent within the same draft
/// list; only long-form children carry one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDraft {
    pub text: String,
    pub doc_type: DocType,
    pub sensitivity_level: SensitivityLevel,
    pub redacted: bool,
    pub is_parent: bool,
    pub section: Option<String>,
    pub parent: Option<usize>,
}

impl ChunkDraft {
    pub fn leaf(text: String, doc_type: DocType, sensitivity_level: SensitivityLevel, redacted: bool) -> Self {
        Self { text, doc_type, sensitivity_level, redacted, is_parent: false, section: None, parent: None }
    }
}

/// A retrievable unit of a document. Never mutated after assembly.
///
/// - `chunk_index`: emission order within the document, starting at 0
/// - `parent_chunk_id`: set only on long-form children; a lookup key, not ownership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub doc_id: DocId,
    pub chunk_id: ChunkId,
    pub chunk_index: usize,
    pub text: String,
    pub doc_type: DocType,
    pub sensitivity_level: SensitivityLevel,
    pub redacted: bool,
    pub is_parent: bool,
    pub parent_chunk_id: Option<ChunkId>,
    pub section: Option<String>,
}

impl Chunk {
    /// The externally visible descriptor consumed by citation UIs and audit logs.
    pub fn to_source(&self, filename: &str, filetype: &str) -> ChunkSource {
        ChunkSource {
            doc_id: self.doc_id.clone(),
            filename: filename.to_string(),
            chunk_index: self.chunk_index,
            filetype: filetype.to_string(),
            doc_type: self.doc_type,
            section: self.section.clone(),
            sensitivity_level: self.sensitivity_level,
            redacted: self.redacted,
            is_parent: self.is_parent,
            parent_chunk_id: self.parent_chunk_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkSource {
    pub doc_id: DocId,
    pub filename: String,
    pub chunk_index: usize,
    pub filetype: String,
    pub doc_type: DocType,
    pub section: Option<String>,
    pub sensitivity_level: SensitivityLevel,
    pub redacted: bool,
    pub is_parent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_chunk_id: Option<ChunkId>,
}

/// Indicates which index produced a raw result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Dense,
    Sparse,
}

/// The minimal surface returned by both indexes.
///
/// `score` is index-specific (inner product or BM25) but higher is always better.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
    pub source: SourceKind,
}

/// A hydrated retrieval result. `score` changes meaning by stage: fused RRF
/// score after fusion, decayed/boosted score after the post-rank filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hit {
    pub chunk_id: ChunkId,
    pub score: f64,
    pub text: String,
    pub source: ChunkSource,
    /// Best raw inner product seen for this chunk across dense lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dense_similarity: Option<f32>,
    /// Whether any sparse list contained this chunk.
    #[serde(default)]
    pub sparse_match: bool,
    /// 0-10 relevance from the rerank collaborator, when it ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

/// Heading extracted verbatim from a chunk, in document order via `idx`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeadingRow {
    pub doc_id: DocId,
    pub idx: i64,
    pub heading_text: String,
    pub chunk_id: ChunkId,
    pub chunk_index: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Factual,
    Procedural,
    Exploratory,
    Structure,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Factual => "factual",
            Intent::Procedural => "procedural",
            Intent::Exploratory => "exploratory",
            Intent::Structure => "structure",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "factual" => Ok(Intent::Factual),
            "procedural" => Ok(Intent::Procedural),
            "exploratory" => Ok(Intent::Exploratory),
            "structure" => Ok(Intent::Structure),
            other => Err(crate::Error::Operation(format!("unknown intent '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RerankParams {
    /// How many fused candidates are sent to the scoring collaborator.
    pub candidates: usize,
    pub top_n: usize,
}

/// Per-intent tuning, selected once per retrieval call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetrievalProfile {
    pub k_per_query: usize,
    pub top_k: usize,
    pub dense_weight: f64,
    pub sparse_weight: f64,
    pub relevance_threshold: f32,
    pub rerank: RerankParams,
}

impl RetrievalProfile {
    pub fn for_intent(intent: Intent, base_k: usize) -> Self {
        match intent {
            Intent::Structure => Self {
                k_per_query: 24,
                top_k: 12,
                dense_weight: 0.45,
                sparse_weight: 0.55,
                relevance_threshold: 0.35,
                rerank: RerankParams { candidates: 16, top_n: 10 },
            },
            Intent::Factual => Self {
                k_per_query: 12,
                top_k: 8,
                dense_weight: 0.55,
                sparse_weight: 0.45,
                relevance_threshold: 0.45,
                rerank: RerankParams { candidates: 12, top_n: 8 },
            },
            Intent::Procedural => Self {
                k_per_query: 14,
                top_k: 8,
                dense_weight: 0.6,
                sparse_weight: 0.4,
                relevance_threshold: 0.45,
                rerank: RerankParams { candidates: 12, top_n: 8 },
            },
            Intent::Exploratory => Self {
                k_per_query: base_k.max(8),
                top_k: base_k,
                dense_weight: 0.6,
                sparse_weight: 0.4,
                relevance_threshold: 0.45,
                rerank: RerankParams { candidates: base_k.max(12), top_n: base_k },
            },
        }
    }
}
