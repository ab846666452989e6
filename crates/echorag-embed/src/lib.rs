//! echorag-embed
//!
//! Embedding collaborators. `HttpEmbedder` talks to an Ollama-style
//! `/api/embeddings` endpoint; `HashEmbedder` is a deterministic bag-of-tokens
//! stand-in used when `APP_USE_FAKE_EMBEDDINGS=1` and in tests.

use anyhow::Result;
use std::sync::Arc;

use echorag_core::settings::EmbeddingSettings;
use echorag_core::traits::Embedder;

mod hash;
mod http;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;

/// Scale `v` to unit length in place. A zero vector is left as is.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-12 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Longest prefix of at most `max_chars` chars that does not cut a word.
///
/// Falls back to a hard cut when the first word alone is too long.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> &str {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    if text[cut..].starts_with(char::is_whitespace) {
        return head.trim_end();
    }
    match head.rfind(char::is_whitespace) {
        Some(ws) if !head[..ws].trim().is_empty() => head[..ws].trim_end(),
        _ => head,
    }
}

fn use_fake_from_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake || use_fake_from_env() {
        tracing::info!(dim = settings.dim, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dim, settings.max_input_chars)));
    }
    Ok(Arc::new(HttpEmbedder::new(settings)?))
}
