//! echorag-llm
//!
//! Chat/completion collaborator and the optional retrieval stages built on
//! it. Every adapter validates the model reply and returns an error when it
//! is unusable, leaving the fallback decision to the caller.

mod chat;
mod classify;
mod compress;
mod rerank;
mod rewrite;

use std::sync::Arc;

pub use chat::{Chat, ChatClient, ChatMessage, ChatOptions};
pub use classify::{parse_intent, LlmIntentClassifier};
pub use compress::{keep_verbatim_sentences, LlmCompressor};
pub use rerank::{parse_scores, LlmReranker};
pub use rewrite::{parse_variants, LlmQueryRewriter, MAX_VARIANTS};

/// All four adapters sharing one chat client.
pub struct LlmStages {
    pub classifier: Arc<LlmIntentClassifier>,
    pub rewriter: Arc<LlmQueryRewriter>,
    pub compressor: Arc<LlmCompressor>,
    pub reranker: Arc<LlmReranker>,
}

impl LlmStages {
    pub fn new(chat: Arc<dyn Chat>) -> Self {
        Self {
            classifier: Arc::new(LlmIntentClassifier::new(chat.clone())),
            rewriter: Arc::new(LlmQueryRewriter::new(chat.clone())),
            compressor: Arc::new(LlmCompressor::new(chat.clone())),
            reranker: Arc::new(LlmReranker::new(chat)),
        }
    }
}
