use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use echorag_core::traits::{Compressor, IntentClassifier, QueryRewriter, Reranker};
use echorag_core::Intent;
use echorag_llm::{
    keep_verbatim_sentences, parse_intent, parse_scores, parse_variants, Chat, ChatMessage, ChatOptions,
    LlmStages,
};

/// Replies with a fixed string and records the last user prompt.
struct Scripted {
    reply: String,
    last_user: Mutex<Option<String>>,
}

impl Scripted {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: reply.to_string(), last_user: Mutex::new(None) })
    }
}

#[async_trait]
impl Chat for Scripted {
    async fn chat(&self, messages: &[ChatMessage], _opts: ChatOptions) -> anyhow::Result<String> {
        let user = messages.iter().rev().find(|m| m.role == "user").map(|m| m.content.clone());
        *self.last_user.lock().unwrap() = user;
        Ok(self.reply.clone())
    }
}

struct Failing;

#[async_trait]
impl Chat for Failing {
    async fn chat(&self, _messages: &[ChatMessage], _opts: ChatOptions) -> anyhow::Result<String> {
        anyhow::bail!("connection refused")
    }
}

#[test]
fn intent_reply_parsing() {
    assert_eq!(parse_intent("structure"), Some(Intent::Structure));
    assert_eq!(parse_intent("  Procedural."), Some(Intent::Procedural));
    assert_eq!(parse_intent("\"factual\" because it asks for a date"), Some(Intent::Factual));
    assert_eq!(parse_intent("I think it is exploratory"), None);
    assert_eq!(parse_intent(""), None);
}

#[test]
fn variants_strip_markers_and_drop_the_original() {
    let reply = "1. solar panel install steps\n- How do I install solar panels?\n\n* \"panel mounting guide\"\n2) PANEL MOUNTING GUIDE\n3. wiring an inverter\n4. one too many";
    let v = parse_variants(reply, "How do I install solar panels?");
    assert_eq!(v, vec!["solar panel install steps", "panel mounting guide", "wiring an inverter"]);
}

#[test]
fn compression_keeps_only_verbatim_sentences() {
    let original = "The pump runs at 40 psi.  It was installed in 2019.\nService it yearly.";
    let reply = "It was installed in 2019. The pump is very old. Service it yearly.";
    assert_eq!(
        keep_verbatim_sentences(original, reply).as_deref(),
        Some("It was installed in 2019. Service it yearly.")
    );
    assert_eq!(keep_verbatim_sentences(original, "Totally new words."), None);
}

#[test]
fn score_parsing_requires_matching_length() {
    assert_eq!(parse_scores("[7, 2.5, 11, -1]", 4), Some(vec![7.0, 2.5, 10.0, 0.0]));
    assert_eq!(parse_scores("Scores: [3, 4] done", 2), Some(vec![3.0, 4.0]));
    assert_eq!(parse_scores("[1, 2, 3]", 2), None);
    assert_eq!(parse_scores("no array here", 1), None);
}

#[tokio::test]
async fn adapters_call_through_the_chat_seam() {
    let stages = LlmStages::new(Scripted::new("procedural"));
    assert_eq!(stages.classifier.classify("how do I reset it").await.unwrap(), Intent::Procedural);

    let chat = Scripted::new("[9, 1]");
    let stages = LlmStages::new(chat.clone());
    let scores = stages
        .reranker
        .score("reset", &["press reset".to_string(), "unrelated".to_string()])
        .await
        .unwrap();
    assert_eq!(scores, vec![9.0, 1.0]);
    let prompt = chat.last_user.lock().unwrap().clone().unwrap();
    assert!(prompt.contains("[1] press reset"));
    assert!(prompt.contains("[2] unrelated"));

    let stages = LlmStages::new(Scripted::new("- reset procedure\n- factory reset"));
    let v = stages.rewriter.rewrite("how do I reset it", Intent::Procedural).await.unwrap();
    assert_eq!(v, vec!["reset procedure", "factory reset"]);
}

#[tokio::test]
async fn unusable_replies_surface_as_errors() {
    let stages = LlmStages::new(Scripted::new("not sure"));
    assert!(stages.classifier.classify("q").await.is_err());
    assert!(stages.compressor.compress("q", "Some passage text.").await.is_err());
    assert!(stages.reranker.score("q", &["a".to_string()]).await.is_err());

    let stages = LlmStages::new(Arc::new(Failing));
    assert!(stages.rewriter.rewrite("q", Intent::Exploratory).await.is_err());
}
