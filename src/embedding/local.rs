//! Local ONNX Runtime embedding provider.
//!
//! Implements [`EmbeddingProvider`] with an ImageBind-style export split into a
//! text tower (`text.onnx`) and a vision tower (`vision.onnx`) via `ort`. Handles
//! tokenization, frame sampling, inference, clip pooling, and L2 normalization.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::frames::{clips_tensor, FrameSampler, CLIPS_PER_VIDEO, FRAMES_PER_CLIP, FRAME_SIZE};
use super::{l2_normalize, Embeddings, EmbeddingProvider};
use crate::config::EmbeddingConfig;

/// Fixed context length of the CLIP-style text tower.
const CONTEXT_LEN: usize = 77;

/// Input names of the exported towers.
const TEXT_INPUT: &str = "text";
const VISION_INPUT: &str = "vision";

/// Local ONNX-based embedding provider.
pub struct LocalEmbeddingProvider {
    text_session: Mutex<Session>,
    vision_session: Mutex<Session>,
    tokenizer: Tokenizer,
    sampler: FrameSampler,
    dims: usize,
}

// Safety: Tokenizer is Send+Sync. Both sessions are behind a Mutex.
// The Mutex guarantees exclusive access during run().
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model_dir = crate::config::expand_tilde(&config.cache_dir).join(&config.model);
        let text_path = model_dir.join("text.onnx");
        let vision_path = model_dir.join("vision.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        for path in [&text_path, &vision_path, &tokenizer_path] {
            anyhow::ensure!(
                path.exists(),
                "model file not found at {}. Place the exported {} files in {}.",
                path.display(),
                config.model,
                model_dir.display()
            );
        }

        let text_session = load_session(&text_path).context("failed to load text model")?;
        tracing::info!(model = %text_path.display(), "text tower loaded");

        let vision_session =
            load_session(&vision_path).context("failed to load vision model")?;
        tracing::info!(model = %vision_path.display(), "vision tower loaded");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;

        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: CONTEXT_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;

        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            strategy: tokenizers::PaddingStrategy::Fixed(CONTEXT_LEN),
            ..Default::default()
        }));

        tracing::info!(tokenizer = %tokenizer_path.display(), "tokenizer loaded");

        Ok(Self {
            text_session: Mutex::new(text_session),
            vision_session: Mutex::new(vision_session),
            tokenizer,
            sampler: FrameSampler::new(&config.ffmpeg_path, &config.ffprobe_path),
            dims: config.dimensions,
        })
    }

    fn embed_texts(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let batch_size = encodings.len();
        let mut ids_flat = Vec::with_capacity(batch_size * CONTEXT_LEN);
        for encoding in &encodings {
            ids_flat.extend(encoding.get_ids().iter().map(|&id| id as i64));
        }

        let shape = vec![batch_size as i64, CONTEXT_LEN as i64];
        let ids_tensor = Tensor::from_array((shape, ids_flat.into_boxed_slice()))?;

        let mut session = self
            .text_session
            .lock()
            .map_err(|e| anyhow::anyhow!("text session lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs! { TEXT_INPUT => ids_tensor })?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("failed to extract text embeddings")?;
        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[0] as usize == batch_size && dims[1] as usize == self.dims,
            "unexpected text embedding shape: {dims:?}, expected [{batch_size}, {}]",
            self.dims
        );

        let embeddings = data.chunks_exact(self.dims).map(l2_normalize).collect();
        Ok(embeddings)
    }

    fn embed_video(&self, path: &Path) -> Result<Vec<f32>> {
        let frames = self
            .sampler
            .sample(path, CLIPS_PER_VIDEO * FRAMES_PER_CLIP)?;
        let input = clips_tensor(&frames, FRAME_SIZE, CLIPS_PER_VIDEO, FRAMES_PER_CLIP)?;
        let input_tensor = Tensor::from_array(input)?;

        let mut session = self
            .vision_session
            .lock()
            .map_err(|e| anyhow::anyhow!("vision session lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs! { VISION_INPUT => input_tensor })?;

        // One row per clip: [clips, dims]
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("failed to extract vision embeddings")?;
        let dims: &[i64] = &shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[1] as usize == self.dims,
            "unexpected vision embedding shape: {dims:?}, expected [clips, {}]",
            self.dims
        );

        let pooled = mean_pool(data, self.dims);
        anyhow::ensure!(
            pooled.iter().all(|v| v.is_finite()),
            "vision embedding contains non-finite values"
        );
        Ok(l2_normalize(&pooled))
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, texts: &[&str], media: &[&Path]) -> Result<Embeddings> {
        let text = self.embed_texts(texts)?;
        let media = media
            .iter()
            .map(|path| {
                self.embed_video(path)
                    .with_context(|| format!("failed to embed {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Embeddings { text, media })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

fn load_session(path: &Path) -> Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(path)?;
    Ok(session)
}

/// Average `rows × dims` row-major data into a single `dims` vector.
fn mean_pool(data: &[f32], dims: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; dims];
    let mut rows = 0usize;
    for row in data.chunks_exact(dims) {
        for (acc, v) in sum.iter_mut().zip(row) {
            *acc += v;
        }
        rows += 1;
    }
    if rows > 0 {
        for acc in &mut sum {
            *acc /= rows as f32;
        }
    }
    sum
}
