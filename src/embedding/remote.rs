//! HTTP embedding provider.
//!
//! Sends texts and clip files to an inference server as a multipart form and reads
//! back both sets of vectors.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::multipart::Form;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{check_embeddings, Embeddings, EmbeddingProvider};
use crate::config::EmbeddingConfig;

/// Blocking client for an embedding server exposing `POST /embed`.
#[derive(Clone)]
pub struct RemoteEmbeddingProvider {
    client: Client,
    endpoint: String,
    model: String,
    dims: usize,
}

impl RemoteEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .context("embedding.endpoint must be set for the remote provider")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build embedding HTTP client")?;
        Ok(Self {
            client,
            endpoint: embed_url(base),
            model: config.model.clone(),
            dims: config.dimensions,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn embed(&self, texts: &[&str], media: &[&Path]) -> Result<Embeddings> {
        if texts.is_empty() && media.is_empty() {
            return Ok(Embeddings::default());
        }

        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("texts", serde_json::to_string(texts)?);
        for path in media {
            form = form
                .file("media", path)
                .with_context(|| format!("failed to attach {}", path.display()))?;
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .with_context(|| format!("embedding request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("embedding request failed ({status}): {body}");
        }

        let parsed: EmbedResponse = response
            .json()
            .context("failed to parse embedding response")?;
        let embeddings = Embeddings {
            text: parsed.text,
            media: parsed.video,
        };
        check_embeddings(&embeddings, texts.len(), media.len(), self.dims)?;
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    text: Vec<Vec<f32>>,
    #[serde(default)]
    video: Vec<Vec<f32>>,
}

fn embed_url(base: &str) -> String {
    format!("{}/embed", base.trim_end_matches('/'))
}
