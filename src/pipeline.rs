//! Search → download → describe → embed orchestration.
//!
//! [`Pipeline::search_and_embed`] is the single entry point. It overfetches
//! candidates, walks them in provider order, and stops as soon as enough records
//! have been collected. Each candidate is processed to completion before the next
//! one starts; its downloaded clip is released at the end of the iteration on
//! every path.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde::Serialize;

use crate::config::{BlockedPolicy, ClipscoutConfig};
use crate::embedding::{self, EmbeddingProvider};
use crate::video::describe::describe;
use crate::video::download::{validate_id, DownloadError, Downloader, YtDlpDownloader};
use crate::video::search::{overfetch_count, SearchProvider, YtDlpSearch};
use crate::video::types::{CandidateDescriptor, ClipWindow, VideoMetadata};
use crate::video::ytdlp::YtDlp;

/// Tunables for a run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub overfetch_factor: f64,
    pub max_duration: u32,
    pub on_blocked: BlockedPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            overfetch_factor: 1.5,
            max_duration: crate::config::MAX_DURATION,
            on_blocked: BlockedPolicy::Skip,
        }
    }
}

impl From<&ClipscoutConfig> for PipelineOptions {
    fn from(config: &ClipscoutConfig) -> Self {
        Self {
            overfetch_factor: config.run.overfetch_factor,
            max_duration: config.download.max_duration,
            on_blocked: config.run.on_blocked,
        }
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Candidates requested from the search provider.
    pub requested: usize,
    /// Candidates the search provider returned.
    pub fetched: usize,
    /// Candidates the loop got to before stopping.
    pub attempted: usize,
    /// Candidates with no usable clip window (zero duration).
    pub skipped_no_window: usize,
    /// Downloads that yielded nothing without a classified error.
    pub soft_failures: usize,
    /// Candidates rejected as not real videos.
    pub skipped_invalid: usize,
    /// Candidates whose download was blocked by the provider.
    pub skipped_blocked: usize,
    /// Candidates whose embedding call failed.
    pub embedding_failures: usize,
    /// Records produced.
    pub emitted: usize,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} record(s) from {} candidate(s) ({} attempted; skipped: {} invalid, {} blocked, \
             {} failed downloads, {} failed embeddings, {} without window)",
            self.emitted,
            self.fetched,
            self.attempted,
            self.skipped_invalid,
            self.skipped_blocked,
            self.soft_failures,
            self.embedding_failures,
            self.skipped_no_window,
        )
    }
}

/// Records collected by a run, in the order their candidates were encountered.
#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<VideoMetadata>,
    pub report: RunReport,
}

/// What happened to one candidate.
enum Outcome {
    Record(VideoMetadata),
    NoWindow,
    SoftFailure,
    Invalid,
    Blocked,
    EmbeddingFailed,
}

/// Owns the three collaborators for the lifetime of a run.
pub struct Pipeline {
    search: Box<dyn SearchProvider>,
    downloader: Box<dyn Downloader>,
    embedder: Box<dyn EmbeddingProvider>,
    options: PipelineOptions,
    progress: Option<ProgressBar>,
}

impl Pipeline {
    pub fn new(
        search: Box<dyn SearchProvider>,
        downloader: Box<dyn Downloader>,
        embedder: Box<dyn EmbeddingProvider>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            search,
            downloader,
            embedder,
            options,
            progress: None,
        }
    }

    /// Wire up the yt-dlp providers and the configured embedding provider.
    ///
    /// Builds blocking clients — call from a blocking context.
    pub fn from_config(config: &ClipscoutConfig) -> Result<Self> {
        let ytdlp = YtDlp::new(&config.download.ytdlp_path);
        let search = YtDlpSearch::new(ytdlp.clone(), config.download.max_duration);
        let downloader = YtDlpDownloader::new(
            ytdlp,
            &config.download.format,
            config.download.max_duration,
        )
        .with_proxy(config.download.proxy.clone());
        let embedder = embedding::create_provider(&config.embedding)
            .context("failed to create embedding provider")?;
        tracing::info!(provider = %config.embedding.provider, "embedding provider ready");

        Ok(Self::new(
            Box::new(search),
            Box::new(downloader),
            embedder,
            PipelineOptions::from(config),
        ))
    }

    /// Report per-candidate progress on `bar`.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Search for `query` and collect up to `target` embedded clips.
    ///
    /// Returns fewer than `target` records when candidates run out. Fails only when a
    /// blocked download meets [`BlockedPolicy::Abort`].
    pub fn search_and_embed(&self, query: &str, target: usize) -> Result<RunOutput> {
        let mut report = RunReport::default();
        let mut records = Vec::with_capacity(target);
        if target == 0 {
            return Ok(RunOutput { records, report });
        }

        report.requested = overfetch_count(target, self.options.overfetch_factor);
        let candidates = self.search.search(query, report.requested);
        report.fetched = candidates.len();
        tracing::info!(
            query,
            requested = report.requested,
            received = report.fetched,
            "search complete"
        );

        if let Some(bar) = &self.progress {
            bar.set_length(candidates.len() as u64);
        }

        for candidate in &candidates {
            report.attempted += 1;
            let outcome = self.process(candidate);
            if let Some(bar) = &self.progress {
                bar.inc(1);
            }

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    if let Some(bar) = &self.progress {
                        bar.finish_and_clear();
                    }
                    return Err(e);
                }
            };

            match outcome {
                Outcome::Record(record) => {
                    tracing::info!(record = %record.to_summary(), "record collected");
                    records.push(record);
                }
                Outcome::NoWindow => report.skipped_no_window += 1,
                Outcome::SoftFailure => report.soft_failures += 1,
                Outcome::Invalid => report.skipped_invalid += 1,
                Outcome::Blocked => report.skipped_blocked += 1,
                Outcome::EmbeddingFailed => report.embedding_failures += 1,
            }

            if records.len() >= target {
                break;
            }
        }

        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }

        report.emitted = records.len();
        if records.len() < target {
            tracing::warn!(
                collected = records.len(),
                target,
                "ran out of candidates before reaching target"
            );
        }
        Ok(RunOutput { records, report })
    }

    fn process(&self, candidate: &CandidateDescriptor) -> Result<Outcome> {
        let video_id = candidate.video_id.as_str();
        let Some(window) = ClipWindow::leading(candidate.duration, self.options.max_duration)
        else {
            tracing::debug!(video_id, duration = candidate.duration, "no clip window, skipping");
            return Ok(Outcome::NoWindow);
        };

        let downloaded =
            validate_id(video_id).and_then(|()| self.downloader.download(video_id, window));
        let media = match downloaded {
            Ok(Some(media)) => media,
            Ok(None) => {
                tracing::debug!(video_id, "download yielded nothing, skipping");
                return Ok(Outcome::SoftFailure);
            }
            Err(e @ DownloadError::InvalidCandidate(_)) => {
                tracing::warn!(video_id, error = %e, "skipping candidate");
                return Ok(Outcome::Invalid);
            }
            Err(e @ DownloadError::Blocked(_)) => match self.options.on_blocked {
                BlockedPolicy::Skip => {
                    tracing::warn!(video_id, error = %e, "download blocked, skipping candidate");
                    return Ok(Outcome::Blocked);
                }
                BlockedPolicy::Abort => {
                    return Err(anyhow::Error::new(e))
                        .with_context(|| format!("aborting run at {video_id}"));
                }
            },
        };

        let description = describe(candidate);
        let embedded = self.embedder.embed_pair(&description, media.path());
        // The clip is no longer needed whatever the embedding outcome.
        drop(media);

        match embedded {
            Ok(pair) => Ok(Outcome::Record(VideoMetadata::new(
                candidate,
                description,
                window,
                pair.media,
                pair.text,
            ))),
            Err(e) => {
                tracing::warn!(video_id, error = %e, "embedding failed, skipping candidate");
                Ok(Outcome::EmbeddingFailed)
            }
        }
    }
}
