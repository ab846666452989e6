//! Parent/child chunking for books and long articles.
//!
//! Emission order is section by section, and within a section
//! parent, its children, next parent, its children.

use echorag_core::{ChunkDraft, DocType, SensitivityLevel};
use regex::Regex;
use std::sync::LazyLock;

use crate::segment::{group, segment, GroupParams};

pub const PARENT_MAX_CHARS: usize = 3500;
pub const LONG_FORM_CHILD: GroupParams = GroupParams::new(400, 700, 2);

static SECTION_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:chapter|part|section)\s+(?:[ivxlc]+|\d+(?:\.\d+)*|one|two|three|four|five|six|seven|eight|nine|ten)\b")
        .ok()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub title: Option<String>,
    pub paragraphs: Vec<&'a str>,
}

pub(super) fn chunk(text: &str, level: SensitivityLevel, redacted: bool) -> Vec<ChunkDraft> {
    let mut drafts = Vec::new();
    for section in split_sections(text) {
        for parent_text in build_parents(&section.paragraphs, PARENT_MAX_CHARS) {
            let children = group(&segment(&parent_text), &LONG_FORM_CHILD);
            let parent_pos = drafts.len();
            drafts.push(ChunkDraft {
                text: parent_text,
                doc_type: DocType::LongForm,
                sensitivity_level: level,
                redacted,
                is_parent: true,
                section: section.title.clone(),
                parent: None,
            });
            drafts.extend(children.into_iter().map(|child| ChunkDraft {
                text: child,
                doc_type: DocType::LongForm,
                sensitivity_level: level,
                redacted,
                is_parent: false,
                section: section.title.clone(),
                parent: Some(parent_pos),
            }));
        }
    }
    drafts
}

/// Split into sections at paragraphs whose first line is a chapter, part or
/// section heading. Text before the first heading is an untitled section.
pub fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections: Vec<Section<'_>> = Vec::new();
    let mut current = Section { title: None, paragraphs: Vec::new() };

    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let first_line = para.lines().next().unwrap_or_default().trim();
        let is_heading = first_line.chars().count() < 120
            && SECTION_HEADING.as_ref().is_some_and(|re| re.is_match(first_line));
        if is_heading {
            if !current.paragraphs.is_empty() {
                sections.push(current);
            }
            current = Section { title: Some(first_line.to_string()), paragraphs: Vec::new() };
        }
        current.paragraphs.push(para);
    }
    if !current.paragraphs.is_empty() {
        sections.push(current);
    }
    sections
}

/// Accumulate paragraphs into parents of at most `max` chars. Each new parent
/// is seeded with the previous paragraph when both fit together. A single
/// paragraph longer than `max` becomes a parent on its own.
pub fn build_parents(paragraphs: &[&str], max: usize) -> Vec<String> {
    let mut parents = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for &p in paragraphs {
        let plen = p.chars().count();
        if !current.is_empty() && current_len + 2 + plen > max {
            parents.push(current.join("\n\n"));
            let seed = current.last().copied().filter(|prev| prev.chars().count() + 2 + plen <= max);
            current.clear();
            current_len = 0;
            if let Some(prev) = seed {
                current.push(prev);
                current_len = prev.chars().count();
            }
        }
        current_len += if current.is_empty() { plen } else { plen + 2 };
        current.push(p);
    }
    if !current.is_empty() {
        parents.push(current.join("\n\n"));
    }
    parents
}
