#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clipscout::config::BlockedPolicy;
use clipscout::embedding::{EmbeddingProvider, Embeddings};
use clipscout::pipeline::{Pipeline, PipelineOptions};
use clipscout::video::download::{DownloadError, Downloader, LocalMedia};
use clipscout::video::search::SearchProvider;
use clipscout::video::types::{CandidateDescriptor, ClipWindow};

pub const TEST_DIMS: usize = 16;
pub const TEST_MAX_DURATION: u32 = 120;

/// An 11-character id unique to `n`.
pub fn test_id(n: usize) -> String {
    format!("vid{n:08}")
}

pub fn candidate(n: usize, duration: u32) -> CandidateDescriptor {
    CandidateDescriptor {
        video_id: test_id(n),
        title: format!("Omega clip {n}"),
        description: Some(format!("Body of clip {n}")),
        duration,
        views: n as u64 * 100,
    }
}

/// `count` candidates, each ten minutes long.
pub fn candidates(count: usize) -> Vec<CandidateDescriptor> {
    (0..count).map(|n| candidate(n, 600)).collect()
}

/// Search provider returning a fixed list, truncated to the requested count.
pub struct FakeSearch {
    pub results: Vec<CandidateDescriptor>,
    pub requests: Arc<Mutex<Vec<(String, usize)>>>,
}

impl FakeSearch {
    pub fn new(results: Vec<CandidateDescriptor>) -> Self {
        Self {
            results,
            requests: Arc::default(),
        }
    }
}

impl SearchProvider for FakeSearch {
    fn search(&self, query: &str, count: usize) -> Vec<CandidateDescriptor> {
        self.requests
            .lock()
            .unwrap()
            .push((query.to_string(), count));
        self.results.iter().take(count).cloned().collect()
    }
}

/// How the scripted downloader responds for a given id.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Succeed,
    Empty,
    Invalid,
    Blocked,
}

/// Downloader that writes a small temp file per call, unless scripted otherwise.
#[derive(Default)]
pub struct ScriptedDownloader {
    pub behaviors: HashMap<String, Behavior>,
    /// Every id the pipeline asked to download, with its window.
    pub attempts: Arc<Mutex<Vec<(String, ClipWindow)>>>,
    /// Paths of every file handed out.
    pub issued: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedDownloader {
    pub fn with(mut self, n: usize, behavior: Behavior) -> Self {
        self.behaviors.insert(test_id(n), behavior);
        self
    }
}

impl Downloader for ScriptedDownloader {
    fn download(
        &self,
        video_id: &str,
        window: ClipWindow,
    ) -> Result<Option<LocalMedia>, DownloadError> {
        self.attempts
            .lock()
            .unwrap()
            .push((video_id.to_string(), window));

        match self
            .behaviors
            .get(video_id)
            .copied()
            .unwrap_or(Behavior::Succeed)
        {
            Behavior::Succeed => {
                let temp = tempfile::NamedTempFile::new().unwrap().into_temp_path();
                std::fs::write(&temp, video_id.as_bytes()).unwrap();
                self.issued.lock().unwrap().push(temp.to_path_buf());
                Ok(Some(LocalMedia::new(temp)))
            }
            Behavior::Empty => Ok(None),
            Behavior::Invalid => Err(DownloadError::InvalidCandidate(format!(
                "ERROR: [youtube] {video_id}: Video unavailable"
            ))),
            Behavior::Blocked => Err(DownloadError::Blocked(
                "ERROR: Your IP is likely being blocked by Youtube".into(),
            )),
        }
    }
}

/// Deterministic embedder. Fails for texts containing any of `fail_on`.
pub struct FakeEmbedder {
    pub dims: usize,
    pub fail_on: HashSet<String>,
    /// Whether each media file existed when it was embedded.
    pub media_seen: Arc<Mutex<Vec<(PathBuf, bool)>>>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            dims: TEST_DIMS,
            fail_on: HashSet::new(),
            media_seen: Arc::default(),
        }
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.insert(needle.to_string());
        self
    }
}

impl EmbeddingProvider for FakeEmbedder {
    fn embed(&self, texts: &[&str], media: &[&Path]) -> Result<Embeddings> {
        if texts
            .iter()
            .any(|t| self.fail_on.iter().any(|needle| t.contains(needle.as_str())))
        {
            anyhow::bail!("model exploded");
        }
        let mut seen = self.media_seen.lock().unwrap();
        for path in media {
            seen.push((path.to_path_buf(), path.exists()));
        }
        Ok(Embeddings {
            text: texts
                .iter()
                .map(|t| vec![t.len() as f32; self.dims])
                .collect(),
            media: media.iter().map(|_| vec![0.5; self.dims]).collect(),
        })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

pub fn options(on_blocked: BlockedPolicy) -> PipelineOptions {
    PipelineOptions {
        overfetch_factor: 1.5,
        max_duration: TEST_MAX_DURATION,
        on_blocked,
    }
}

pub fn pipeline(
    search: FakeSearch,
    downloader: ScriptedDownloader,
    embedder: FakeEmbedder,
    on_blocked: BlockedPolicy,
) -> Pipeline {
    Pipeline::new(
        Box::new(search),
        Box::new(downloader),
        Box::new(embedder),
        options(on_blocked),
    )
}
