use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

use echorag_core::traits::Reranker;

use crate::chat::{Chat, ChatMessage, ChatOptions};

const SYSTEM_PROMPT: &str = "Rate how well each numbered passage answers the question on a \
scale from 0 (irrelevant) to 10 (answers it fully). Reply with a JSON array of numbers, one \
per passage, in the same order, and nothing else.";

/// Passages are cut to this many chars in the prompt.
const PASSAGE_CHARS: usize = 800;

pub struct LlmReranker {
    chat: Arc<dyn Chat>,
}

impl LlmReranker {
    pub fn new(chat: Arc<dyn Chat>) -> Self {
        Self { chat }
    }
}

/// First JSON array in the reply, if it holds exactly `expected` numbers.
/// Scores are clamped to 0-10.
pub fn parse_scores(reply: &str, expected: usize) -> Option<Vec<f32>> {
    let start = reply.find('[')?;
    let end = reply[start..].find(']')? + start;
    let values: Vec<f64> = serde_json::from_str(&reply[start..=end]).ok()?;
    if values.len() != expected {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(values.into_iter().map(|v| v.clamp(0.0, 10.0) as f32).collect())
}

fn user_prompt(question: &str, candidates: &[String]) -> String {
    let mut out = format!("Question: {question}\n\nPassages:\n");
    for (i, c) in candidates.iter().enumerate() {
        let passage: String = c.chars().take(PASSAGE_CHARS).collect();
        let _ = writeln!(out, "[{}] {}", i + 1, passage.replace('\n', " "));
    }
    out
}

#[async_trait]
impl Reranker for LlmReranker {
    async fn score(&self, question: &str, candidates: &[String]) -> Result<Vec<f32>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let messages =
            [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt(question, candidates))];
        let reply = self.chat.chat(&messages, ChatOptions::new(0.0, 128)).await?;
        parse_scores(&reply, candidates.len()).ok_or_else(|| {
            anyhow::anyhow!("rerank reply is not {} scores: '{reply}'", candidates.len())
        })
    }
}
