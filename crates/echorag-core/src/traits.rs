use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{Chunk, ChunkId, DocId, Document, HeadingRow, IndexState, Intent, SearchHit};

/// Text-in, vector-out embedding collaborator.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// Longest input (in chars) the service accepts.
    fn max_input_chars(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenseEntry {
    pub chunk_id: ChunkId,
    pub doc_id: DocId,
    /// Unit length, so inner product equals cosine similarity.
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseEntry {
    pub chunk_id: ChunkId,
    pub doc_id: DocId,
    pub tokens: Vec<String>,
}

/// Dense vector index. Inserts with an existing `chunk_id` replace the entry.
#[async_trait]
pub trait DenseIndex: Send + Sync {
    async fn insert(&self, entries: &[DenseEntry]) -> anyhow::Result<()>;
    async fn delete_doc(&self, doc_id: &str) -> anyhow::Result<()>;
    /// A read view pinned to the current committed state.
    async fn snapshot(&self) -> anyhow::Result<Arc<dyn DenseSnapshot>>;
}

#[async_trait]
pub trait DenseSnapshot: Send + Sync {
    /// Top `k` by inner product, best first.
    async fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Sparse (BM25) index over pre-tokenized text.
pub trait SparseIndex: Send + Sync {
    fn insert(&self, entries: &[SparseEntry]) -> anyhow::Result<()>;
    fn delete_doc(&self, doc_id: &str) -> anyhow::Result<()>;
    fn snapshot(&self) -> anyhow::Result<Arc<dyn SparseSnapshot>>;
}

pub trait SparseSnapshot: Send + Sync {
    fn search(&self, tokens: &[String], k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Relational store for documents, all chunks (parents included) and headings.
pub trait ChunkStore: Send + Sync {
    /// Writes the document row and its chunks in one transaction, in the
    /// `Pending` index state.
    fn insert_document(&self, doc: &Document, chunks: &[Chunk]) -> anyhow::Result<()>;
    fn set_index_state(&self, doc_id: &str, state: IndexState) -> anyhow::Result<()>;
    fn documents_in_state(&self, state: IndexState) -> anyhow::Result<Vec<DocId>>;
    fn get_document(&self, doc_id: &str) -> anyhow::Result<Option<Document>>;
    /// Newest first.
    fn list_documents(&self) -> anyhow::Result<Vec<Document>>;
    fn get_chunk(&self, chunk_id: &str) -> anyhow::Result<Option<Chunk>>;
    fn chunk_at(&self, doc_id: &str, chunk_index: usize) -> anyhow::Result<Option<Chunk>>;
    /// Ordered by `chunk_index`.
    fn chunks_for_doc(&self, doc_id: &str) -> anyhow::Result<Vec<Chunk>>;
    /// Removes the document, its chunks and its headings. Returns false when
    /// no such document existed.
    fn delete_document(&self, doc_id: &str) -> anyhow::Result<bool>;
    fn replace_headings(&self, doc_id: &str, rows: &[HeadingRow]) -> anyhow::Result<()>;
    /// Ordered by `(doc_id, idx)`.
    fn headings_for_docs(&self, doc_ids: &[DocId]) -> anyhow::Result<Vec<HeadingRow>>;
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, question: &str) -> anyhow::Result<Intent>;
}

/// Produces alternate phrasings of a question. The original is not included.
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    async fn rewrite(&self, question: &str, intent: Intent) -> anyhow::Result<Vec<String>>;
}

/// Keeps only question-relevant sentences of `text`, verbatim.
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(&self, question: &str, text: &str) -> anyhow::Result<String>;
}

/// One 0-10 relevance score per candidate, in input order.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn score(&self, question: &str, candidates: &[String]) -> anyhow::Result<Vec<f32>>;
}
