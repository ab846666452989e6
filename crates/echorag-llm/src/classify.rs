use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use echorag_core::traits::IntentClassifier;
use echorag_core::Intent;

use crate::chat::{Chat, ChatMessage, ChatOptions};

const SYSTEM_PROMPT: &str = "Classify the user's question into exactly one category: \
factual (a specific fact, date, number or definition), \
procedural (how to do something, steps), \
exploratory (open-ended, summary, discussion), \
structure (table of contents, list of chapters, sections or headings). \
Reply with the single category word only.";

pub struct LlmIntentClassifier {
    chat: Arc<dyn Chat>,
}

impl LlmIntentClassifier {
    pub fn new(chat: Arc<dyn Chat>) -> Self {
        Self { chat }
    }
}

/// First alphabetic word of the reply, read as an intent label.
pub fn parse_intent(reply: &str) -> Option<Intent> {
    let word: String = reply
        .trim_start_matches(|c: char| !c.is_alphabetic())
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect();
    word.parse().ok()
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, question: &str) -> Result<Intent> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(question)];
        let reply = self.chat.chat(&messages, ChatOptions::new(0.0, 8)).await?;
        parse_intent(&reply).ok_or_else(|| anyhow::anyhow!("unrecognised intent reply '{reply}'"))
    }
}
