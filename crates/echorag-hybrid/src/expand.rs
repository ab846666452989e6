//! Question intent and alternate phrasings.

use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use echorag_core::traits::{IntentClassifier, QueryRewriter};
use echorag_core::Intent;

pub const MAX_QUERIES: usize = 4;

const STRUCTURE_PHRASES: &[&str] = &[
    "table of contents",
    "list of chapters",
    "chapter list",
    "list the chapters",
    "what are the chapters",
    "chapters in",
    "contents of the",
    "book structure",
    "section list",
    "list sections",
    "list of sections",
    "chapter titles",
    "section titles",
    "list the sections",
    "list all headings",
    "list headings",
    "what sections",
    "how many chapters",
    "how many parts",
    "how many sections",
    "number of chapters",
    "number of sections",
    "list the parts",
    "parts of the",
    "headings in",
];

const STRUCTURE_WORDS: &[&str] =
    &["chapters", "sections", "headings", "contents", "toc", "parts", "structure", "list", "table", "index", "outline"];

const STRUCTURE_OPENERS: &[&str] = &["list", "how many", "what are the", "which chapters", "which sections", "name the"];

const PROCEDURAL_PHRASES: &[&str] =
    &["how do i", "how to", "how can i", "steps to", "steps for", "process for", "procedure", "walk me through"];

const FACTUAL_PHRASES: &[&str] =
    &["what is ", "what was ", "define ", "definition of", "exact date", "exact number", "how much", "how many"];

static FACTUAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\bdate\b", r"\bnumber\b", r"\bwhen did\b", r"\bwho wrote\b", r"\bwho said\b"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_structure(q: &str, words: &HashSet<&str>) -> bool {
    if words.contains("toc") || STRUCTURE_PHRASES.iter().any(|p| q.contains(p)) {
        return true;
    }
    let singular = ["chapter", "section", "heading", "part", "content"];
    if words.contains("list") && singular.iter().any(|s| words.contains(s) || words.contains(format!("{s}s").as_str())) {
        return true;
    }
    if q.contains("how many") && ["chapter", "section", "part"].iter().any(|s| q.contains(s)) {
        return true;
    }
    STRUCTURE_OPENERS.iter().any(|o| q.starts_with(o)) && STRUCTURE_WORDS.iter().any(|w| words.contains(w))
}

/// Keyword rules, checked as structure, procedural, factual; anything else
/// (including empty input) is exploratory.
pub fn heuristic_intent(question: &str) -> Intent {
    let q = question.trim().to_lowercase();
    if q.is_empty() {
        return Intent::Exploratory;
    }
    let all = words(&q);
    let set: HashSet<&str> = all.iter().map(String::as_str).collect();
    if is_structure(&q, &set) {
        Intent::Structure
    } else if PROCEDURAL_PHRASES.iter().any(|p| q.contains(p)) {
        Intent::Procedural
    } else if FACTUAL_PHRASES.iter().any(|p| q.contains(p)) || FACTUAL_PATTERNS.iter().any(|re| re.is_match(&q)) {
        Intent::Factual
    } else {
        Intent::Exploratory
    }
}

const QUESTION_FILLER: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "do", "does", "did", "i", "we", "you", "me", "my", "our",
    "can", "could", "should", "would", "will", "what", "which", "who", "whom", "how", "why", "when", "where", "of",
    "to", "in", "on", "for", "about", "please", "tell", "explain", "there", "it", "this", "that", "and", "or",
];

/// The question with question words and filler removed.
pub fn keywords(question: &str) -> String {
    words(&question.to_lowercase())
        .into_iter()
        .filter(|w| !QUESTION_FILLER.contains(&w.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rule-based variants for `intent`. The original question is not included.
pub fn heuristic_variants(question: &str, intent: Intent) -> Vec<String> {
    let kw = keywords(question);
    let mut out = Vec::new();
    match intent {
        Intent::Structure => {
            out.push("table of contents".to_string());
            out.push("chapter section headings".to_string());
            if !kw.is_empty() {
                out.push(kw);
            }
        }
        Intent::Procedural if !kw.is_empty() => {
            out.push(format!("steps to {kw}"));
            out.push(kw);
        }
        _ if !kw.is_empty() => out.push(kw),
        _ => {}
    }
    out
}

/// Original first, case-insensitive duplicates and blanks removed, at most
/// [`MAX_QUERIES`].
pub fn merge_queries(question: &str, variants: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for q in std::iter::once(question.trim().to_string()).chain(variants) {
        let q = q.trim().to_string();
        if q.is_empty() || !seen.insert(q.to_lowercase()) {
            continue;
        }
        out.push(q);
        if out.len() == MAX_QUERIES {
            break;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub intent: Intent,
    pub queries: Vec<String>,
}

/// Heuristic expansion, optionally refined by external classification and
/// rewrite calls. Those calls are bounded by `timeout` and any failure falls
/// back to the heuristic result.
#[derive(Clone)]
pub struct QueryExpander {
    classifier: Option<Arc<dyn IntentClassifier>>,
    rewriter: Option<Arc<dyn QueryRewriter>>,
    timeout: Duration,
}

impl QueryExpander {
    pub fn new(
        classifier: Option<Arc<dyn IntentClassifier>>,
        rewriter: Option<Arc<dyn QueryRewriter>>,
        timeout: Duration,
    ) -> Self {
        Self { classifier, rewriter, timeout }
    }

    pub async fn expand(&self, question: &str) -> Expansion {
        let intent = self.intent(question).await;
        let variants = match self.rewrite(question, intent).await {
            Some(v) if !v.is_empty() => v,
            _ => heuristic_variants(question, intent),
        };
        let queries = merge_queries(question, variants);
        tracing::debug!(intent = %intent, queries = queries.len(), "expanded question");
        Expansion { intent, queries }
    }

    async fn intent(&self, question: &str) -> Intent {
        let heuristic = heuristic_intent(question);
        let Some(classifier) = &self.classifier else {
            return heuristic;
        };
        match tokio::time::timeout(self.timeout, classifier.classify(question)).await {
            Ok(Ok(intent)) => intent,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "intent classification failed, using heuristic");
                heuristic
            }
            Err(_) => {
                tracing::warn!("intent classification timed out, using heuristic");
                heuristic
            }
        }
    }

    async fn rewrite(&self, question: &str, intent: Intent) -> Option<Vec<String>> {
        let rewriter = self.rewriter.as_ref()?;
        match tokio::time::timeout(self.timeout, rewriter.rewrite(question, intent)).await {
            Ok(Ok(v)) => Some(v),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "query rewrite failed, using heuristic variants");
                None
            }
            Err(_) => {
                tracing::warn!("query rewrite timed out, using heuristic variants");
                None
            }
        }
    }
}

const SMALL_TALK_PHRASES: &[&str] = &[
    "how are you",
    "how's it going",
    "what's up",
    "whats up",
    "good morning",
    "good afternoon",
    "good evening",
    "good night",
    "nice to meet you",
    "thank you",
    "see you",
    "who are you",
];

const SMALL_TALK_WORDS: &[&str] = &[
    "hi", "hello", "hey", "hiya", "yo", "thanks", "thank", "thx", "ty", "cheers", "bye", "goodbye", "ok", "okay",
    "cool", "great", "nice", "sure", "yes", "no", "yep", "nope", "morning", "evening", "you", "lol", "awesome",
    "perfect", "alright", "good", "much", "very", "so",
];

const QUESTION_WORDS: &[&str] = &["what", "how", "why", "when", "where", "who", "which", "list", "show", "explain"];

/// Greetings, thanks and small talk that should not hit the indexes.
/// Short topical queries ("pricing", "setup guide") are not small talk.
pub fn is_general_conversation(question: &str) -> bool {
    let q = question.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    let bare = q.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    if SMALL_TALK_PHRASES.iter().any(|p| bare == *p || bare.starts_with(&format!("{p} "))) {
        return words(bare).len() <= 6;
    }
    let ws = words(bare);
    if ws.is_empty() {
        return true;
    }
    if ws.len() > 4 || q.contains('?') || ws.iter().any(|w| QUESTION_WORDS.contains(&w.as_str())) {
        return false;
    }
    ws.iter().all(|w| SMALL_TALK_WORDS.contains(&w.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_drop_question_words() {
        assert_eq!(keywords("How do I install the solar panels?"), "install solar panels");
        assert_eq!(keywords("what is it"), "");
    }

    #[test]
    fn merge_caps_and_dedupes() {
        let got = merge_queries("Q one", ["q ONE", "two", "", "three", "four", "five"].map(String::from));
        assert_eq!(got, vec!["Q one", "two", "three", "four"]);
    }
}
