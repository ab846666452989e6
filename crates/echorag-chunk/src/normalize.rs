//! Cleanup for text pulled out of PDF/DOCX/PPTX extractors: hyphenated line
//! breaks, letter-spaced headings and ragged whitespace.

use regex::Regex;
use std::sync::LazyLock;

static HYPHEN_BREAK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\w)\s*-\s*\n\s*").ok());

/// `"pat-\ntern"` becomes `"pattern"`.
pub fn dehyphenate(text: &str) -> String {
    match HYPHEN_BREAK.as_ref() {
        Some(re) => re.replace_all(text, "$1").into_owned(),
        None => text.to_string(),
    }
}

/// `"C H A P T E R"` becomes `"CHAPTER"`. Runs never cross a paragraph break.
pub fn collapse_spaced_letters(text: &str) -> String {
    let tokens = split_keep_whitespace(text);
    let is_letter = |t: &str| {
        let mut cs = t.chars();
        matches!((cs.next(), cs.next()), (Some(c), None) if c.is_alphanumeric())
    };
    let is_gap = |t: &str| t.chars().all(char::is_whitespace) && !t.contains("\n\n");

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < tokens.len() {
        if is_letter(tokens[i]) {
            // extend over letter, gap, letter, gap, ...
            let mut end = i;
            while end + 2 < tokens.len() && is_gap(tokens[end + 1]) && is_letter(tokens[end + 2]) {
                end += 2;
            }
            if end > i {
                for t in tokens[i..=end].iter().step_by(2) {
                    out.push_str(t);
                }
                i = end + 1;
                continue;
            }
        }
        out.push_str(tokens[i]);
        i += 1;
    }
    out
}

/// Collapse spaces, tabs and single newlines to one space; keep `\n\n`
/// between non-empty paragraphs.
pub fn normalize_whitespace(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut collapsed = String::with_capacity(part.len());
            let mut in_ws = false;
            for c in part.chars() {
                if c.is_whitespace() {
                    if !in_ws {
                        collapsed.push(' ');
                    }
                    in_ws = true;
                } else {
                    collapsed.push(c);
                    in_ws = false;
                }
            }
            collapsed
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn normalize_extracted_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    normalize_whitespace(&collapse_spaced_letters(&dehyphenate(text)))
}

fn split_keep_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_ws: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let ws = c.is_whitespace();
        if prev_ws.is_some_and(|p| p != ws) {
            tokens.push(&text[start..i]);
            start = i;
        }
        prev_ws = Some(ws);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}
