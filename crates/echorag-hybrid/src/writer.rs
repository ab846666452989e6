//! Keeps the relational store, the dense index and the sparse index in step
//! for one document at a time.

use std::sync::Arc;

use echorag_chunk::heading_rows;
use echorag_core::traits::{ChunkStore, DenseEntry, DenseIndex, Embedder, SparseEntry, SparseIndex};
use echorag_core::{Chunk, DocId, Document, IndexState, IngestError};
use echorag_embed::{l2_normalize, truncate_at_word_boundary};
use echorag_text::tokenize;

use crate::options::RetryPolicy;

/// The storage side shared by ingestion and retrieval.
#[derive(Clone)]
pub struct Backends {
    pub embedder: Arc<dyn Embedder>,
    pub dense: Arc<dyn DenseIndex>,
    pub sparse: Arc<dyn SparseIndex>,
    pub store: Arc<dyn ChunkStore>,
}

pub struct IndexWriter {
    backends: Backends,
    retry: RetryPolicy,
}

fn store_err(e: anyhow::Error) -> IngestError {
    IngestError::Store(format!("{e:#}"))
}

fn index_err(e: anyhow::Error) -> IngestError {
    IngestError::Index(format!("{e:#}"))
}

impl IndexWriter {
    pub fn new(backends: Backends, retry: RetryPolicy) -> Self {
        Self { backends, retry }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Embed the non-parent chunks, then write the document and every chunk
    /// to the store and the embeddable ones to both indexes.
    ///
    /// Vectors are computed before anything is written, so an embedding
    /// failure leaves no trace. A later write failure removes whatever was
    /// written for `doc.id`. Returns the number of indexed chunks.
    pub async fn index_document(&self, doc: &Document, chunks: &[Chunk]) -> Result<usize, IngestError> {
        let embeddable: Vec<&Chunk> = chunks.iter().filter(|c| !c.is_parent).collect();
        let vectors = self.embed_with_retry(&embeddable).await?;

        self.backends.store.insert_document(doc, chunks).map_err(store_err)?;
        if let Err(e) = self.write_indexes(&doc.id, chunks, &embeddable, vectors).await {
            self.rollback(&doc.id).await;
            return Err(e);
        }
        tracing::info!(doc_id = %doc.id, chunks = chunks.len(), indexed = embeddable.len(), "indexed document");
        Ok(embeddable.len())
    }

    async fn write_indexes(
        &self,
        doc_id: &str,
        chunks: &[Chunk],
        embeddable: &[&Chunk],
        vectors: Vec<Vec<f32>>,
    ) -> Result<(), IngestError> {
        let dense: Vec<DenseEntry> = embeddable
            .iter()
            .zip(vectors)
            .map(|(c, vector)| DenseEntry { chunk_id: c.chunk_id.clone(), doc_id: c.doc_id.clone(), vector })
            .collect();
        let sparse: Vec<SparseEntry> = embeddable
            .iter()
            .map(|c| SparseEntry { chunk_id: c.chunk_id.clone(), doc_id: c.doc_id.clone(), tokens: tokenize(&c.text) })
            .collect();

        self.backends.dense.insert(&dense).await.map_err(index_err)?;
        self.backends.sparse.insert(&sparse).map_err(index_err)?;
        self.backends.store.replace_headings(doc_id, &heading_rows(doc_id, chunks)).map_err(store_err)?;
        self.backends.store.set_index_state(doc_id, IndexState::Indexed).map_err(store_err)
    }

    async fn rollback(&self, doc_id: &str) {
        if let Err(e) = self.backends.dense.delete_doc(doc_id).await {
            tracing::warn!(doc_id, error = %e, "rollback: dense delete failed");
        }
        if let Err(e) = self.backends.sparse.delete_doc(doc_id) {
            tracing::warn!(doc_id, error = %e, "rollback: sparse delete failed");
        }
        if let Err(e) = self.backends.store.delete_document(doc_id) {
            tracing::warn!(doc_id, error = %e, "rollback: store delete failed");
        }
    }

    /// One batch request per attempt, each bounded by the policy timeout.
    async fn embed_with_retry(&self, chunks: &[&Chunk]) -> Result<Vec<Vec<f32>>, IngestError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let max_chars = self.backends.embedder.max_input_chars();
        let texts: Vec<String> =
            chunks.iter().map(|c| truncate_at_word_boundary(&c.text, max_chars).to_string()).collect();

        let mut last_error = String::new();
        for attempt in 1..=self.retry.max_attempts {
            let call = self.backends.embedder.embed_batch(&texts);
            match tokio::time::timeout(self.retry.timeout, call).await {
                Ok(Ok(mut vectors)) if vectors.len() == texts.len() => {
                    for v in &mut vectors {
                        l2_normalize(v);
                    }
                    return Ok(vectors);
                }
                Ok(Ok(vectors)) => {
                    last_error = format!("expected {} vectors, got {}", texts.len(), vectors.len());
                }
                Ok(Err(e)) => last_error = format!("{e:#}"),
                Err(_) => last_error = format!("timed out after {:?}", self.retry.timeout),
            }
            tracing::warn!(attempt, max = self.retry.max_attempts, error = %last_error, "embedding attempt failed");
            if attempt < self.retry.max_attempts {
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
            }
        }
        Err(IngestError::EmbeddingExhausted { attempts: self.retry.max_attempts, message: last_error })
    }

    /// Remove a document from both indexes and then from the store.
    pub async fn delete_document(&self, doc_id: &str) -> Result<bool, IngestError> {
        self.backends.dense.delete_doc(doc_id).await.map_err(index_err)?;
        self.backends.sparse.delete_doc(doc_id).map_err(index_err)?;
        let existed = self.backends.store.delete_document(doc_id).map_err(store_err)?;
        tracing::info!(doc_id, existed, "deleted document");
        Ok(existed)
    }

    /// Rebuild the index entries of a stored document from its chunks.
    pub async fn reindex(&self, doc_id: &str) -> Result<usize, IngestError> {
        let chunks = self.backends.store.chunks_for_doc(doc_id).map_err(store_err)?;
        if self.backends.store.get_document(doc_id).map_err(store_err)?.is_none() {
            return Err(IngestError::NotFound(doc_id.to_string()));
        }
        let embeddable: Vec<&Chunk> = chunks.iter().filter(|c| !c.is_parent).collect();
        let vectors = self.embed_with_retry(&embeddable).await?;

        self.backends.dense.delete_doc(doc_id).await.map_err(index_err)?;
        self.backends.sparse.delete_doc(doc_id).map_err(index_err)?;
        self.write_indexes(doc_id, &chunks, &embeddable, vectors).await?;
        Ok(embeddable.len())
    }

    /// Re-index every document left `pending` by an interrupted ingestion.
    pub async fn repair(&self) -> Result<Vec<DocId>, IngestError> {
        let pending = self.backends.store.documents_in_state(IndexState::Pending).map_err(store_err)?;
        for doc_id in &pending {
            let n = self.reindex(doc_id).await?;
            tracing::info!(doc_id = %doc_id, chunks = n, "repaired document");
        }
        Ok(pending)
    }

    /// Recompute the heading index of every stored document.
    pub fn backfill_headings(&self) -> Result<usize, IngestError> {
        let store = &self.backends.store;
        let mut total = 0;
        for doc in store.list_documents().map_err(store_err)? {
            let chunks = store.chunks_for_doc(&doc.id).map_err(store_err)?;
            let rows = heading_rows(&doc.id, &chunks);
            total += rows.len();
            store.replace_headings(&doc.id, &rows).map_err(store_err)?;
        }
        Ok(total)
    }
}
