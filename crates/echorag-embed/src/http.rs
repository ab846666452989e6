use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use echorag_core::settings::EmbeddingSettings;
use echorag_core::traits::Embedder;

use crate::l2_normalize;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Client for an Ollama-style embeddings endpoint, one request per text.
pub struct HttpEmbedder {
    url: String,
    model: String,
    dim: usize,
    max_input_chars: usize,
    client: reqwest::Client,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("build embedding http client")?;
        Ok(Self {
            url: settings.url.clone(),
            model: settings.model.clone(),
            dim: settings.dim,
            max_input_chars: settings.max_input_chars,
            client,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let resp = self
                .client
                .post(&self.url)
                .json(&EmbeddingRequest { model: &self.model, prompt: text })
                .send()
                .await
                .with_context(|| format!("embedding request to {} failed", self.url))?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("embedding service returned {status}: {body}");
            }
            let mut vector = resp.json::<EmbeddingResponse>().await?.embedding;
            anyhow::ensure!(
                vector.len() == self.dim,
                "embedding dim {} does not match configured {}",
                vector.len(),
                self.dim
            );
            l2_normalize(&mut vector);
            out.push(vector);
        }
        Ok(out)
    }
}
