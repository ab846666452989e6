use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use echorag_core::traits::QueryRewriter;
use echorag_core::Intent;

use crate::chat::{Chat, ChatMessage, ChatOptions};

pub const MAX_VARIANTS: usize = 3;

static LIST_PREFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*\u{2022}]|\d+[.)]|\(\d+\))\s*").ok());

pub struct LlmQueryRewriter {
    chat: Arc<dyn Chat>,
}

impl LlmQueryRewriter {
    pub fn new(chat: Arc<dyn Chat>) -> Self {
        Self { chat }
    }
}

fn system_prompt(intent: Intent) -> String {
    let hint = match intent {
        Intent::Structure => "Favour words like contents, chapters, sections and headings.",
        Intent::Factual => "Keep names, numbers and dates exactly as written.",
        Intent::Procedural => "Phrase them as steps or instructions.",
        Intent::Exploratory => "Use synonyms and related keywords.",
    };
    format!(
        "Rewrite the question into {MAX_VARIANTS} alternative search queries. {hint} \
         Return one query per line and nothing else."
    )
}

/// Reply lines with list markers and quotes stripped; the original question
/// and case-insensitive repeats are dropped, at most [`MAX_VARIANTS`] kept.
pub fn parse_variants(reply: &str, question: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(question.trim().to_lowercase());
    let mut out = Vec::new();
    for line in reply.lines() {
        let line = match LIST_PREFIX.as_ref() {
            Some(re) => re.replace(line, "").into_owned(),
            None => line.to_string(),
        };
        let line = line.trim().trim_matches('"').trim();
        if line.is_empty() || !seen.insert(line.to_lowercase()) {
            continue;
        }
        out.push(line.to_string());
        if out.len() == MAX_VARIANTS {
            break;
        }
    }
    out
}

#[async_trait]
impl QueryRewriter for LlmQueryRewriter {
    async fn rewrite(&self, question: &str, intent: Intent) -> Result<Vec<String>> {
        let messages = [ChatMessage::system(system_prompt(intent)), ChatMessage::user(question)];
        let reply = self.chat.chat(&messages, ChatOptions::new(0.2, 180)).await?;
        Ok(parse_variants(&reply, question))
    }
}
