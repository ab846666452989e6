use echorag_core::{ChunkDraft, DocType, SensitivityLevel};

use super::truncate_chars;
use crate::classify::QUESTION_MARKER;

/// Hard cap per question/answer block.
pub const FAQ_MAX_CHARS: usize = 8000;
const MIN_BLOCK_CHARS: usize = 5;

pub(super) fn chunk(text: &str, level: SensitivityLevel, redacted: bool) -> Vec<ChunkDraft> {
    let mut drafts: Vec<ChunkDraft> = split_faq_blocks(text)
        .into_iter()
        .filter(|b| b.chars().count() >= MIN_BLOCK_CHARS)
        .map(|b| ChunkDraft::leaf(truncate_chars(b, FAQ_MAX_CHARS).to_string(), DocType::Faq, level, redacted))
        .collect();
    if drafts.is_empty() {
        drafts.push(ChunkDraft::leaf(
            truncate_chars(text, FAQ_MAX_CHARS).to_string(),
            DocType::Faq,
            level,
            redacted,
        ));
    }
    drafts
}

/// Cut `text` right before each question marker line, so every block holds
/// one question together with its answer. Without explicit markers, lines
/// ending in `?` start the blocks instead.
pub fn split_faq_blocks(text: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = QUESTION_MARKER
        .as_ref()
        .map(|re| re.find_iter(text).map(|m| m.start()).collect())
        .unwrap_or_default();
    if starts.is_empty() {
        starts = question_line_starts(text);
    }

    let mut cuts = Vec::with_capacity(starts.len() + 2);
    cuts.push(0);
    cuts.extend(starts.into_iter().filter(|&s| s > 0));
    cuts.push(text.len());

    cuts.windows(2)
        .map(|w| text[w[0]..w[1]].trim())
        .filter(|b| !b.is_empty())
        .collect()
}

fn question_line_starts(text: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().ends_with('?') {
            out.push(offset);
        }
        offset += line.len();
    }
    out
}
