//! Type-specific chunk producers, one variant per document type.

mod faq;
mod long_form;

pub use faq::{split_faq_blocks, FAQ_MAX_CHARS};
pub use long_form::{build_parents, split_sections, Section, LONG_FORM_CHILD, PARENT_MAX_CHARS};

use echorag_core::{ChunkDraft, DocType, SensitivityLevel};

use crate::segment::{group, segment, GroupParams};

pub const SENSITIVE_GROUP: GroupParams = GroupParams::new(225, 450, 0);
pub const DEFAULT_GROUP: GroupParams = GroupParams::new(400, 800, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Faq,
    LongForm,
    Sensitive,
    Default,
}

impl Strategy {
    pub fn for_doc_type(doc_type: DocType) -> Self {
        match doc_type {
            DocType::Faq => Strategy::Faq,
            DocType::LongForm => Strategy::LongForm,
            DocType::Sensitive => Strategy::Sensitive,
            DocType::Default => Strategy::Default,
        }
    }

    pub fn doc_type(self) -> DocType {
        match self {
            Strategy::Faq => DocType::Faq,
            Strategy::LongForm => DocType::LongForm,
            Strategy::Sensitive => DocType::Sensitive,
            Strategy::Default => DocType::Default,
        }
    }

    /// Drafts in emission order. Blank input gives no drafts.
    pub fn run(self, clean_text: &str, level: SensitivityLevel, redacted: bool) -> Vec<ChunkDraft> {
        let text = clean_text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        match self {
            Strategy::Faq => faq::chunk(text, level, redacted),
            Strategy::LongForm => long_form::chunk(text, level, redacted),
            Strategy::Sensitive => sentence_groups(text, &SENSITIVE_GROUP, DocType::Sensitive, level, redacted),
            Strategy::Default => sentence_groups(text, &DEFAULT_GROUP, DocType::Default, level, redacted),
        }
    }
}

fn sentence_groups(
    text: &str,
    params: &GroupParams,
    doc_type: DocType,
    level: SensitivityLevel,
    redacted: bool,
) -> Vec<ChunkDraft> {
    group(&segment(text), params)
        .into_iter()
        .map(|t| ChunkDraft::leaf(t, doc_type, level, redacted))
        .collect()
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    s.char_indices().nth(max).map_or(s, |(i, _)| &s[..i])
}
