//! Heading extraction for the `doc_headings` structure index.

use echorag_core::{Chunk, HeadingRow};
use regex::Regex;
use std::sync::LazyLock;

static HEADING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(?:chapter|part|section|introduction|conclusion|appendix|preface)\b\s*(?:[ivxlc\d]+|one|two|three|four|five|six|seven|eight|nine|ten)?\s*[.:]?\s*.*$",
        r"^[A-Z][A-Z\s]{2,50}$",
        r"(?i)^(?:table of )?contents\s*$",
        r"^\d{1,2}\.\s*\d{0,2}\s*[A-Za-z].*$",
        r"^[IVXLC]+\.\s+[A-Za-z].*$",
        r"^[A-Za-z]\)\s+[A-Za-z].*$",
        r"^[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,5}\s*$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Heading-like lines of `text`, verbatim and deduplicated, in order.
pub fn extract_headings(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let raw = line.trim();
        let len = raw.chars().count();
        if !(2..=200).contains(&len) {
            continue;
        }
        if HEADING_PATTERNS.iter().any(|re| re.is_match(raw)) && !out.iter().any(|h| h == raw) {
            out.push(raw.to_string());
        }
    }
    out
}

/// Rows for every heading of every chunk, ordered by `chunk_index * 1000 + local`.
pub fn heading_rows(doc_id: &str, chunks: &[Chunk]) -> Vec<HeadingRow> {
    let mut rows = Vec::new();
    for chunk in chunks {
        for (local, heading_text) in extract_headings(&chunk.text).into_iter().enumerate() {
            rows.push(HeadingRow {
                doc_id: doc_id.to_string(),
                idx: chunk.chunk_index as i64 * 1000 + local as i64,
                heading_text,
                chunk_id: chunk.chunk_id.clone(),
                chunk_index: chunk.chunk_index,
            });
        }
    }
    rows
}
