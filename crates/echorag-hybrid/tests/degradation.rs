use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use echorag_core::traits::{
    DenseEntry, DenseIndex, DenseSnapshot, Embedder, IntentClassifier, QueryRewriter, Reranker, SparseEntry,
    SparseIndex,
};
use echorag_core::{
    ChunkSource, DocType, Document, Hit, Intent, Meta, RetrievalProfile, SearchHit, SensitivityLevel, SourceKind,
};
use echorag_embed::{l2_normalize, HashEmbedder};
use echorag_hybrid::expand::merge_queries;
use echorag_hybrid::rerank::rerank_stage;
use echorag_hybrid::{heuristic_intent, heuristic_variants, HybridSearcher, QueryExpander, Scored};
use echorag_text::{tokenize, TantivySparseIndex};

const SHORT: Duration = Duration::from_millis(50);
const FOREVER: Duration = Duration::from_secs(30);

enum Behaviour {
    Fail,
    Hang,
}

struct StuckClassifier(Behaviour);

#[async_trait]
impl IntentClassifier for StuckClassifier {
    async fn classify(&self, _question: &str) -> Result<Intent> {
        match self.0 {
            Behaviour::Fail => Err(anyhow!("model not loaded")),
            Behaviour::Hang => {
                tokio::time::sleep(FOREVER).await;
                Ok(Intent::Structure)
            }
        }
    }
}

struct FixedClassifier(Intent);

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(&self, _question: &str) -> Result<Intent> {
        Ok(self.0)
    }
}

struct StuckRewriter(Behaviour);

#[async_trait]
impl QueryRewriter for StuckRewriter {
    async fn rewrite(&self, _question: &str, _intent: Intent) -> Result<Vec<String>> {
        match self.0 {
            Behaviour::Fail => Err(anyhow!("502 bad gateway")),
            Behaviour::Hang => {
                tokio::time::sleep(FOREVER).await;
                Ok(vec!["never seen".to_string()])
            }
        }
    }
}

const QUESTION: &str = "How do I prime the water pump?";

fn expected_fallback() -> (Intent, Vec<String>) {
    let intent = heuristic_intent(QUESTION);
    (intent, merge_queries(QUESTION, heuristic_variants(QUESTION, intent)))
}

#[tokio::test]
async fn classifier_failure_or_timeout_falls_back_to_heuristic_intent() {
    let (intent, queries) = expected_fallback();
    assert_eq!(intent, Intent::Procedural);

    for behaviour in [Behaviour::Fail, Behaviour::Hang] {
        let expander = QueryExpander::new(Some(Arc::new(StuckClassifier(behaviour))), None, SHORT);
        let out = expander.expand(QUESTION).await;
        assert_eq!(out.intent, intent);
        assert_eq!(out.queries, queries);
    }

    let expander = QueryExpander::new(Some(Arc::new(FixedClassifier(Intent::Factual))), None, SHORT);
    assert_eq!(expander.expand(QUESTION).await.intent, Intent::Factual);
}

#[tokio::test]
async fn rewriter_failure_or_timeout_falls_back_to_heuristic_variants() {
    let (intent, queries) = expected_fallback();
    for behaviour in [Behaviour::Fail, Behaviour::Hang] {
        let expander = QueryExpander::new(None, Some(Arc::new(StuckRewriter(behaviour))), SHORT);
        let out = expander.expand(QUESTION).await;
        assert_eq!(out.intent, intent);
        assert_eq!(out.queries, queries);
        assert_eq!(out.queries[0], QUESTION);
    }
}

/// Answers lookups for `fast` immediately and stalls on any other vector.
struct StallingDense {
    fast: Vec<f32>,
}

#[async_trait]
impl DenseIndex for StallingDense {
    async fn insert(&self, _entries: &[DenseEntry]) -> Result<()> {
        Ok(())
    }

    async fn delete_doc(&self, _doc_id: &str) -> Result<()> {
        Ok(())
    }

    async fn snapshot(&self) -> Result<Arc<dyn DenseSnapshot>> {
        Ok(Arc::new(StallingSnapshot { fast: self.fast.clone() }))
    }
}

struct StallingSnapshot {
    fast: Vec<f32>,
}

#[async_trait]
impl DenseSnapshot for StallingSnapshot {
    async fn search(&self, query: &[f32], _k: usize) -> Result<Vec<SearchHit>> {
        let same = query.len() == self.fast.len() && query.iter().zip(&self.fast).all(|(a, b)| (a - b).abs() < 1e-6);
        if !same {
            tokio::time::sleep(FOREVER).await;
        }
        Ok(vec![SearchHit { id: "c_pump".into(), score: 0.9, source: SourceKind::Dense }])
    }
}

#[tokio::test]
async fn slow_variant_is_dropped_and_question_lists_survive() {
    let embedder = Arc::new(HashEmbedder::new(64, 2048));
    let question = "prime the water pump".to_string();
    let mut fast = embedder.embed_batch(std::slice::from_ref(&question)).await.unwrap().remove(0);
    l2_normalize(&mut fast);

    let sparse = Arc::new(TantivySparseIndex::in_ram().unwrap());
    sparse
        .insert(&[SparseEntry {
            chunk_id: "c_pump".into(),
            doc_id: "doc_water".into(),
            tokens: tokenize("Prime the water pump by filling the casing."),
        }])
        .unwrap();

    let searcher =
        HybridSearcher::new(embedder, Arc::new(StallingDense { fast }), sparse, Duration::from_secs(2), SHORT);
    let queries = vec![question, "solar inverter fault".to_string()];
    let started = std::time::Instant::now();
    let lists = searcher.search(&queries, 5).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(lists.len(), 2);
    assert!(lists.iter().any(|l| l.kind == SourceKind::Dense));
    let sparse_list = lists.iter().find(|l| l.kind == SourceKind::Sparse).unwrap();
    assert_eq!(sparse_list.hits[0].id, "c_pump");
}

fn candidates(n: usize) -> Vec<Scored> {
    let doc = Arc::new(Document {
        id: "doc_a".into(),
        filename: "a.txt".into(),
        filetype: "text".into(),
        created_at: Utc::now(),
        metadata: Meta::new(),
    });
    (0..n)
        .map(|i| Scored {
            hit: Hit {
                chunk_id: format!("c{i}"),
                score: 1.0 / (i as f64 + 1.0),
                text: format!("passage {i}"),
                source: ChunkSource {
                    doc_id: doc.id.clone(),
                    filename: doc.filename.clone(),
                    chunk_index: i,
                    filetype: doc.filetype.clone(),
                    doc_type: DocType::Default,
                    section: None,
                    sensitivity_level: SensitivityLevel::Low,
                    redacted: false,
                    is_parent: false,
                    parent_chunk_id: None,
                },
                dense_similarity: Some(0.7),
                sparse_match: false,
                rerank_score: None,
            },
            doc: doc.clone(),
        })
        .collect()
}

enum RerankFault {
    Error,
    Hang,
    ShortReply,
}

struct FaultyReranker(RerankFault);

#[async_trait]
impl Reranker for FaultyReranker {
    async fn score(&self, _question: &str, candidates: &[String]) -> Result<Vec<f32>> {
        match self.0 {
            RerankFault::Error => Err(anyhow!("unparseable reply")),
            RerankFault::Hang => {
                tokio::time::sleep(FOREVER).await;
                Ok(vec![5.0; candidates.len()])
            }
            RerankFault::ShortReply => Ok(vec![9.0; candidates.len() - 1]),
        }
    }
}

#[tokio::test]
async fn rerank_faults_keep_fused_order_truncated_to_top_k() {
    let profile = RetrievalProfile::for_intent(Intent::Exploratory, 3);
    assert_eq!(profile.top_k, 3);

    for fault in [RerankFault::Error, RerankFault::Hang, RerankFault::ShortReply] {
        let reranker: Arc<dyn Reranker> = Arc::new(FaultyReranker(fault));
        let out = rerank_stage("q", candidates(6), Some(&reranker), &profile, SHORT).await;
        let ids: Vec<&str> = out.iter().map(|s| s.hit.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2"]);
        assert!(out.iter().all(|s| s.hit.rerank_score.is_none()));
    }
}
