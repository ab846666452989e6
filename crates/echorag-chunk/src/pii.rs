//! Regex PII scanner shared by the classifier and the sanitizer.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// A compiled PII pattern with its redaction placeholder.
pub struct PiiPattern {
    pub name: &'static str,
    pub regex: &'static LazyLock<Option<Regex>>,
    pub placeholder: &'static str,
}

macro_rules! pii_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

pii_pattern!(RE_EMAIL, r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b");
pii_pattern!(RE_PHONE, r"\b(?:\+?1[-.]?)?\(?[0-9]{3}\)?[-.]?[0-9]{3}[-.]?[0-9]{4}\b");
pii_pattern!(RE_SSN, r"\b\d{3}-\d{2}-\d{4}\b");
pii_pattern!(RE_CARD, r"\b(?:\d{4}[- ]?){3}\d{4}\b");
pii_pattern!(RE_ID, r"\b[A-Z]{2}\d{6,8}\b");
pii_pattern!(RE_LONG_NUMBER, r"\b\d{10,}\b");

/// Applied in this order by the sanitizer.
pub static PII_PATTERNS: [PiiPattern; 6] = [
    PiiPattern { name: "email", regex: &RE_EMAIL, placeholder: "[REDACTED_EMAIL]" },
    PiiPattern { name: "phone", regex: &RE_PHONE, placeholder: "[REDACTED_PHONE]" },
    PiiPattern { name: "ssn", regex: &RE_SSN, placeholder: "[REDACTED_SSN]" },
    PiiPattern { name: "card", regex: &RE_CARD, placeholder: "[REDACTED_CARD]" },
    PiiPattern { name: "id", regex: &RE_ID, placeholder: "[REDACTED_ID]" },
    PiiPattern { name: "long_number", regex: &RE_LONG_NUMBER, placeholder: "[REDACTED_NUM]" },
];

/// Byte ranges matched by any pattern, sorted and merged.
pub fn pii_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = PII_PATTERNS
        .iter()
        .filter_map(|p| p.regex.as_ref())
        .flat_map(|re| re.find_iter(text).map(|m| m.range()))
        .collect();
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    merged
}

/// Fraction of characters covered by at least one PII match.
pub fn pii_density(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let matched: usize = pii_ranges(text).into_iter().map(|r| text[r].chars().count()).sum();
    matched as f64 / total as f64
}
