use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;

use echorag_core::{Chunk, Document, HeadingRow, Meta};

pub(crate) const DOCUMENT_COLUMNS: &str = "id, filename, filetype, created_at, meta_json";

pub(crate) const CHUNK_COLUMNS: &str = "id, doc_id, chunk_index, text, doc_type, sensitivity_level, \
     redacted, is_parent, parent_chunk_id, section";

/// Fixed-width UTC timestamps so `ORDER BY created_at` is chronological.
pub(crate) fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn to_i64(n: usize) -> Result<i64> {
    i64::try_from(n).context("index does not fit in sqlite integer")
}

fn to_usize(n: i64) -> Result<usize> {
    usize::try_from(n).with_context(|| format!("negative index {n} in store"))
}

/// Column reads can fail at the sqlite layer (outer) or while decoding a
/// stored value into a domain type (inner).
pub(crate) fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Document>> {
    let id: String = row.get(0)?;
    let filename: String = row.get(1)?;
    let filetype: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let meta_json: String = row.get(4)?;
    Ok(decode_document(id, filename, filetype, &created_at, &meta_json))
}

fn decode_document(id: String, filename: String, filetype: String, created_at: &str, meta_json: &str) -> Result<Document> {
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .with_context(|| format!("bad created_at for {id}"))?
        .with_timezone(&Utc);
    let metadata: Meta = serde_json::from_str(meta_json).with_context(|| format!("bad meta_json for {id}"))?;
    Ok(Document { id, filename, filetype, created_at, metadata })
}

pub(crate) fn chunk_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Chunk>> {
    let chunk_id: String = row.get(0)?;
    let doc_id: String = row.get(1)?;
    let chunk_index: i64 = row.get(2)?;
    let text: String = row.get(3)?;
    let doc_type: String = row.get(4)?;
    let level: String = row.get(5)?;
    let redacted: bool = row.get(6)?;
    let is_parent: bool = row.get(7)?;
    let parent_chunk_id: Option<String> = row.get(8)?;
    let section: Option<String> = row.get(9)?;
    let decoded = to_usize(chunk_index).and_then(|chunk_index| {
        Ok(Chunk {
            chunk_index,
            doc_type: doc_type.parse()?,
            sensitivity_level: level.parse()?,
            doc_id,
            chunk_id,
            text,
            redacted,
            is_parent,
            parent_chunk_id,
            section,
        })
    });
    Ok(decoded)
}

pub(crate) fn heading_from_row(row: &Row<'_>) -> rusqlite::Result<Result<HeadingRow>> {
    let doc_id: String = row.get(0)?;
    let idx: i64 = row.get(1)?;
    let heading_text: String = row.get(2)?;
    let chunk_id: String = row.get(3)?;
    let chunk_index: i64 = row.get(4)?;
    Ok(to_usize(chunk_index).map(|chunk_index| HeadingRow { doc_id, idx, heading_text, chunk_id, chunk_index }))
}
