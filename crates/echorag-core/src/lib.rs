//! echorag-core
//!
//! Shared domain types, collaborator traits, error types and configuration
//! for the chunking and hybrid retrieval pipeline.

pub mod config;
pub mod error;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{Error, IngestError, Result, RetrievalError};
pub use settings::Settings;
pub use traits::{
    ChunkStore, Compressor, DenseEntry, DenseIndex, DenseSnapshot, Embedder, IntentClassifier,
    QueryRewriter, Reranker, SparseEntry, SparseIndex, SparseSnapshot,
};
pub use types::{
    Chunk, ChunkDraft, ChunkId, ChunkSource, DocId, DocType, Document, HeadingRow, Hit, IndexState,
    Intent, Meta, RerankParams, RetrievalProfile, SearchHit, SensitivityLevel, SourceKind,
};
