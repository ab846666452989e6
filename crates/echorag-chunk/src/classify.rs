//! Heuristic document type detection. No model calls; pure and deterministic.

use echorag_core::DocType;
use regex::Regex;
use std::sync::LazyLock;

use crate::pii::pii_density;

pub const SENSITIVE_DENSITY: f64 = 0.015;
const FAQ_MARKER_WINDOW: usize = 2000;
const LONG_FORM_MIN_CHARS: usize = 8000;
const LONG_FORM_MIN_BREAKS: usize = 5;

/// "Q:", "Q1.", "Question 2:", "3. Q)" at the start of a line.
pub(crate) static QUESTION_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:\d+[.)][ \t]*)?q(?:uestion)?[ \t]*\d*[ \t]*[:.)]").ok()
});

static HEADING_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:chapter|part|section|\d+[.)])\s+\S").ok());

pub(crate) fn is_question_line(line: &str) -> bool {
    let line = line.trim();
    if line.ends_with('?') {
        return true;
    }
    QUESTION_MARKER.as_ref().is_some_and(|re| re.is_match(line))
}

/// Label `text` as SENSITIVE, FAQ, LONG_FORM or DEFAULT, first match wins.
pub fn classify_document(text: &str) -> DocType {
    let t = text.trim();
    if t.is_empty() {
        return DocType::Default;
    }
    let lines: Vec<&str> = t.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    if pii_density(t) >= SENSITIVE_DENSITY {
        DocType::Sensitive
    } else if looks_like_faq(t, &lines) {
        DocType::Faq
    } else if looks_like_long_form(t, &lines) {
        DocType::LongForm
    } else {
        DocType::Default
    }
}

fn looks_like_faq(text: &str, lines: &[&str]) -> bool {
    let q_count = lines.iter().filter(|l| is_question_line(l)).count();
    if q_count < 2 {
        return false;
    }
    // at least 3 question lines making up 10% or more of all lines
    if q_count >= 3 && q_count * 10 >= lines.len() {
        return true;
    }
    let head: String = text.chars().take(FAQ_MARKER_WINDOW).collect::<String>().to_lowercase();
    head.contains("faq") || head.contains("frequently asked")
}

fn looks_like_long_form(text: &str, lines: &[&str]) -> bool {
    let length = text.chars().count();
    if length < LONG_FORM_MIN_CHARS {
        return false;
    }
    let breaks = text.matches("\n\n").count();
    if breaks < LONG_FORM_MIN_BREAKS {
        return false;
    }
    let heading_like = lines
        .iter()
        .filter(|l| l.chars().count() < 120)
        .filter(|l| HEADING_LINE.as_ref().is_some_and(|re| re.is_match(l)))
        .count();
    if heading_like >= 2 || (breaks >= 20 && length > 20_000) {
        return true;
    }
    let avg_line = lines.iter().map(|l| l.chars().count()).sum::<usize>() as f64 / lines.len().max(1) as f64;
    avg_line > 80.0 && length > 15_000
}
