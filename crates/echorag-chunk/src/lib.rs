//! echorag-chunk
//!
//! Turns raw document text into an ordered list of chunks: PII scan,
//! document type classification, redaction, type-specific chunking and id
//! assignment. Everything here is pure and deterministic.

pub mod assemble;
pub mod classify;
pub mod headings;
pub mod normalize;
pub mod pii;
pub mod sanitize;
pub mod segment;
pub mod strategies;

use echorag_core::{Chunk, DocType};

pub use assemble::{assemble, new_doc_id};
pub use classify::classify_document;
pub use headings::{extract_headings, heading_rows};
pub use normalize::normalize_extracted_text;
pub use sanitize::{sanitize, Sanitized};
pub use segment::{group, group_ranges, segment, GroupParams};
pub use strategies::Strategy;

/// Classify, sanitize, chunk and assemble `text` for `doc_id`.
///
/// Empty or whitespace-only input yields no chunks.
pub fn chunk_document(text: &str, doc_id: &str) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let doc_type = classify_document(text);
    chunk_document_as(text, doc_id, doc_type)
}

/// Same pipeline with the document type fixed by the caller.
pub fn chunk_document_as(text: &str, doc_id: &str, doc_type: DocType) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let sanitized = sanitize(text);
    let drafts = Strategy::for_doc_type(doc_type).run(&sanitized.text, sanitized.level, sanitized.redacted);
    let chunks = assemble(drafts, doc_id);
    tracing::debug!(
        doc_id,
        doc_type = %doc_type,
        redacted = sanitized.redacted,
        chunks = chunks.len(),
        "chunked document"
    );
    chunks
}
