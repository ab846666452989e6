//! Immutable per-call options, built once from [`Settings`].

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::str::FromStr;
use std::time::Duration;

use echorag_core::settings::{ContextSettings, EmbeddingSettings};
use echorag_core::Settings;

/// How far back a document's `created_at` may lie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    All,
    Last(ChronoDuration),
}

impl TimeWindow {
    pub fn contains(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            TimeWindow::All => true,
            TimeWindow::Last(span) => now.signed_duration_since(created_at) <= *span,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = echorag_core::Error;

    /// `all`, or a count followed by `h`, `d` or `w` (`24h`, `48h`, `1w`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s.is_empty() || s == "all" {
            return Ok(TimeWindow::All);
        }
        let bad = || echorag_core::Error::Operation(format!("unknown time window '{s}'"));
        let cut = s.char_indices().last().map_or(0, |(i, _)| i);
        let (num, unit) = s.split_at(cut);
        let n: i64 = num.parse().map_err(|_| bad())?;
        if n <= 0 {
            return Err(bad());
        }
        let span = match unit {
            "h" => ChronoDuration::try_hours(n),
            "d" => ChronoDuration::try_days(n),
            "w" => ChronoDuration::try_weeks(n),
            _ => None,
        };
        span.map(TimeWindow::Last).ok_or_else(bad)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayParams {
    pub halflife_days: f64,
    pub min_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagBoostParams {
    pub factor: f64,
    pub max_boost: f64,
}

/// Feature flags and tuning for one `retrieve` call. Disabled optional
/// stages are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    pub default_k: usize,
    pub rrf_k: f64,
    pub fan_in_timeout: Duration,
    /// Bound on each optional external call (classify, rewrite, rerank).
    pub stage_timeout: Duration,
    /// Bound on embedding the question.
    pub embed_timeout: Duration,
    pub tie_epsilon: f64,
    pub llm_intent: bool,
    pub query_rewrite: bool,
    pub decay: Option<DecayParams>,
    pub tag_boost: Option<TagBoostParams>,
    pub adjacent_expansion: bool,
    pub rerank: bool,
    pub relevance_gate: bool,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for RetrievalOptions {
    fn from(settings: &Settings) -> Self {
        let r = &settings.retrieval;
        Self {
            default_k: r.default_k,
            rrf_k: r.rrf_k,
            fan_in_timeout: Duration::from_millis(r.fan_in_timeout_ms),
            stage_timeout: Duration::from_millis(settings.llm.timeout_ms),
            embed_timeout: Duration::from_millis(settings.embedding.timeout_ms),
            tie_epsilon: r.tie_epsilon,
            llm_intent: r.llm_intent,
            query_rewrite: r.query_rewrite,
            decay: r.recency_decay.then_some(DecayParams {
                halflife_days: r.halflife_days,
                min_factor: r.min_decay_factor,
            }),
            tag_boost: r.tag_boost.then_some(TagBoostParams {
                factor: r.tag_boost_factor,
                max_boost: r.max_tag_boost,
            }),
            adjacent_expansion: r.adjacent_expansion,
            rerank: r.rerank,
            relevance_gate: r.relevance_gate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextOptions {
    pub parent_max_chars: usize,
    pub compress: bool,
    pub compress_timeout: Duration,
    /// Jaccard threshold; `None` disables sentence dedupe.
    pub dedupe_threshold: Option<f64>,
}

impl ContextOptions {
    pub fn new(context: &ContextSettings, compress_timeout: Duration) -> Self {
        Self {
            parent_max_chars: context.parent_max_chars,
            compress: context.compress,
            compress_timeout,
            dedupe_threshold: context.sentence_dedupe.then_some(context.dedupe_threshold),
        }
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ContextOptions {
    fn from(settings: &Settings) -> Self {
        Self::new(&settings.context, Duration::from_millis(settings.llm.timeout_ms))
    }
}

/// Bounded retry for embedding calls made while indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Exponential: `backoff`, `2 * backoff`, `4 * backoff`, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

impl From<&EmbeddingSettings> for RetryPolicy {
    fn from(e: &EmbeddingSettings) -> Self {
        Self {
            max_attempts: e.max_attempts.max(1),
            backoff: Duration::from_millis(e.backoff_ms),
            timeout: Duration::from_millis(e.timeout_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&EmbeddingSettings::default())
    }
}
