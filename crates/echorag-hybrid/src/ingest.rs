use chrono::{DateTime, Utc};
use serde::Serialize;

use echorag_chunk::{chunk_document, new_doc_id, normalize_extracted_text};
use echorag_core::{DocId, DocType, Document, HeadingRow, IngestError, Meta};

use crate::options::RetryPolicy;
use crate::writer::{Backends, IndexWriter};

/// Filetypes whose text comes out of an extractor and gets normalised first.
pub const EXTRACTED_FILETYPES: &[&str] = &["pdf", "docx", "pptx"];

#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub filename: String,
    pub filetype: String,
    pub text: String,
    pub metadata: Meta,
    /// Defaults to the time of ingestion.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewDocument {
    pub fn new(filename: impl Into<String>, filetype: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            filetype: filetype.into(),
            text: text.into(),
            metadata: Meta::new(),
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Meta) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    fn is_extracted(&self) -> bool {
        EXTRACTED_FILETYPES.iter().any(|t| self.filetype.eq_ignore_ascii_case(t))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestReport {
    pub doc_id: DocId,
    pub doc_type: DocType,
    pub chunks: usize,
    pub indexed: usize,
}

/// Document lifecycle: ingest, delete, list, crash repair and heading
/// backfill.
pub struct Ingestor {
    writer: IndexWriter,
}

impl Ingestor {
    pub fn new(backends: Backends, retry: RetryPolicy) -> Self {
        Self { writer: IndexWriter::new(backends, retry) }
    }

    pub fn writer(&self) -> &IndexWriter {
        &self.writer
    }

    /// Chunk, embed, index and store one document. Text that yields no
    /// chunks is a no-op and returns `None`.
    pub async fn ingest(&self, new: NewDocument) -> Result<Option<IngestReport>, IngestError> {
        let text = if new.is_extracted() { normalize_extracted_text(&new.text) } else { new.text.clone() };
        let doc_id = new_doc_id();
        let chunks = chunk_document(&text, &doc_id);
        let Some(doc_type) = chunks.first().map(|c| c.doc_type) else {
            tracing::info!(filename = %new.filename, "no text to index, skipped");
            return Ok(None);
        };

        let doc = Document {
            id: doc_id.clone(),
            filename: new.filename,
            filetype: new.filetype,
            created_at: new.created_at.unwrap_or_else(Utc::now),
            metadata: new.metadata,
        };
        let indexed = self.writer.index_document(&doc, &chunks).await?;
        Ok(Some(IngestReport { doc_id, doc_type, chunks: chunks.len(), indexed }))
    }

    pub async fn delete_document(&self, doc_id: &str) -> Result<bool, IngestError> {
        self.writer.delete_document(doc_id).await
    }

    /// Newest first.
    pub fn list_documents(&self) -> Result<Vec<Document>, IngestError> {
        self.writer.backends().store.list_documents().map_err(|e| IngestError::Store(format!("{e:#}")))
    }

    pub async fn repair(&self) -> Result<Vec<DocId>, IngestError> {
        self.writer.repair().await
    }

    pub fn backfill_headings(&self) -> Result<usize, IngestError> {
        self.writer.backfill_headings()
    }

    /// Stored headings in document order, for answering structure questions
    /// verbatim.
    pub fn headings_for_docs(&self, doc_ids: &[DocId]) -> Result<Vec<HeadingRow>, IngestError> {
        self.writer.backends().store.headings_for_docs(doc_ids).map_err(|e| IngestError::Store(format!("{e:#}")))
    }
}
