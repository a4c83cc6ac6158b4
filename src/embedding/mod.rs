//! Joint text/video embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait and two implementations: a local
//! ImageBind-style ONNX export run through ONNX Runtime ([`local`]) and an HTTP
//! inference server ([`remote`]). The provider is created via [`create_provider`]
//! from configuration.

pub mod frames;
pub mod local;
pub mod remote;

use std::path::Path;

use anyhow::Result;

/// Embedding vectors for a batch of texts and a batch of media files.
///
/// `text[i]` belongs to the i-th input text and `media[i]` to the i-th input file.
#[derive(Debug, Clone, Default)]
pub struct Embeddings {
    pub text: Vec<Vec<f32>>,
    pub media: Vec<Vec<f32>>,
}

/// One text vector and one media vector produced together for a single input pair.
#[derive(Debug, Clone)]
pub struct EmbeddingPair {
    pub text: Vec<f32>,
    pub media: Vec<f32>,
}

/// Trait for embedding text and media into a shared vector space.
///
/// All methods are synchronous — callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every text and every media file. Outputs are positionally aligned with
    /// their inputs.
    fn embed(&self, texts: &[&str], media: &[&Path]) -> Result<Embeddings>;

    /// Number of dimensions this provider produces for both modalities.
    fn dimensions(&self) -> usize;

    /// Embed a single text/media pair, checking the shape of what came back.
    fn embed_pair(&self, text: &str, media: &Path) -> Result<EmbeddingPair> {
        let embeddings = self.embed(&[text], &[media])?;
        check_embeddings(&embeddings, 1, 1, self.dimensions())?;
        let Embeddings { text, media } = embeddings;
        match (text.into_iter().next(), media.into_iter().next()) {
            (Some(text), Some(media)) => Ok(EmbeddingPair { text, media }),
            _ => anyhow::bail!("embedding provider returned no vectors"),
        }
    }
}

/// Verify counts and dimensionality of a provider response.
pub fn check_embeddings(
    embeddings: &Embeddings,
    texts: usize,
    media: usize,
    dims: usize,
) -> Result<()> {
    anyhow::ensure!(
        embeddings.text.len() == texts,
        "got {} text embeddings for {} texts",
        embeddings.text.len(),
        texts
    );
    anyhow::ensure!(
        embeddings.media.len() == media,
        "got {} media embeddings for {} media files",
        embeddings.media.len(),
        media
    );
    for v in embeddings.text.iter().chain(embeddings.media.iter()) {
        anyhow::ensure!(
            v.len() == dims && dims > 0,
            "embedding has {} dimensions, expected {dims}",
            v.len()
        );
    }
    Ok(())
}

/// L2-normalize a vector. Returns the input unchanged if its norm is zero.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

/// Create an embedding provider from config.
///
/// `"local"` loads ONNX model files from the cache directory; `"remote"` talks to an
/// inference server at `embedding.endpoint`.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        "remote" => {
            let provider = remote::RemoteEmbeddingProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, remote"),
    }
}
