use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use echorag_chunk::segment;
use echorag_core::traits::Compressor;

use crate::chat::{Chat, ChatMessage, ChatOptions};

const SYSTEM_PROMPT: &str = "Copy only the sentences from the passage that directly help answer \
the question. Copy them exactly, word for word, in their original order. Do not paraphrase, \
summarise or add anything.";

pub struct LlmCompressor {
    chat: Arc<dyn Chat>,
}

impl LlmCompressor {
    pub fn new(chat: Arc<dyn Chat>) -> Self {
        Self { chat }
    }
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The reply's sentences that occur verbatim (modulo whitespace) in
/// `original`, joined by single spaces. `None` when nothing survives.
pub fn keep_verbatim_sentences(original: &str, reply: &str) -> Option<String> {
    let haystack = squash(original);
    let kept: Vec<String> = segment(reply)
        .into_iter()
        .map(squash)
        .filter(|s| haystack.contains(s.as_str()))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

#[async_trait]
impl Compressor for LlmCompressor {
    async fn compress(&self, question: &str, text: &str) -> Result<String> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Question: {question}\n\nPassage:\n{text}")),
        ];
        let reply = self.chat.chat(&messages, ChatOptions::new(0.0, 400)).await?;
        keep_verbatim_sentences(text, &reply)
            .ok_or_else(|| anyhow::anyhow!("compression reply kept no verbatim sentence"))
    }
}
