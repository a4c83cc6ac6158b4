//! Download step — fetch a time-bounded, low-quality clip into a temporary file.
//!
//! [`Downloader`] is the seam the pipeline consumes. A download either yields a
//! [`LocalMedia`] handle, yields nothing (a soft failure that is logged and
//! skipped), or fails with a classified [`DownloadError`].

use std::path::Path;

use tempfile::TempPath;

use super::types::ClipWindow;
use super::ytdlp::{watch_url, YtDlp};

/// Exact length of a well-formed video id.
pub const VIDEO_ID_LEN: usize = 11;

/// Provider messages meaning our network identity or request pattern is throttled.
const BLOCKED_MESSAGES: &[&str] = &[
    "Your IP is likely being blocked by Youtube",
    "Requested format is not available",
];

/// Provider messages meaning the video cannot exist or was referenced wrongly.
const INVALID_MESSAGES: &[&str] = &[
    "Video unavailable",
    "is not a valid URL",
    "Incomplete YouTube ID",
];

/// Classified download failures. Everything else is a soft failure.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The id is malformed or the video no longer exists. Never retry.
    #[error("not a real video: {0}")]
    InvalidCandidate(String),

    /// The provider is rate-limiting or blocking us. Retry later, ideally from a
    /// different network path.
    #[error("download blocked by provider: {0}")]
    Blocked(String),
}

impl DownloadError {
    /// `true` if the same request may succeed later.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// A downloaded clip on local disk. The file is deleted when the handle is dropped.
#[derive(Debug)]
pub struct LocalMedia {
    path: TempPath,
}

impl LocalMedia {
    pub fn new(path: TempPath) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the backing file in bytes (0 if it vanished).
    pub fn size(&self) -> u64 {
        std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

/// Fetches clips for candidates.
pub trait Downloader: Send + Sync {
    /// Download `window` of `video_id`.
    ///
    /// Returns `Ok(None)` on a soft failure (empty result, unclassified provider
    /// error). The pipeline rejects malformed ids before calling this; implementations
    /// that reach the network still check with [`validate_id`].
    fn download(
        &self,
        video_id: &str,
        window: ClipWindow,
    ) -> Result<Option<LocalMedia>, DownloadError>;
}

pub fn is_valid_id(video_id: &str) -> bool {
    video_id.chars().count() == VIDEO_ID_LEN
}

/// Reject ids that cannot be real before any download is attempted.
pub fn validate_id(video_id: &str) -> Result<(), DownloadError> {
    if is_valid_id(video_id) {
        Ok(())
    } else {
        Err(DownloadError::InvalidCandidate(format!(
            "invalid video id: {video_id:?}"
        )))
    }
}

/// Map a provider failure message to a classified error, if it matches a known phrase.
///
/// Blocking phrases win over invalid-video phrases.
pub fn classify_failure(message: &str) -> Option<DownloadError> {
    if BLOCKED_MESSAGES.iter().any(|m| message.contains(m)) {
        return Some(DownloadError::Blocked(message.to_string()));
    }
    if INVALID_MESSAGES.iter().any(|m| message.contains(m)) {
        return Some(DownloadError::InvalidCandidate(message.to_string()));
    }
    None
}

/// Downloads through `yt-dlp --download-sections`.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    ytdlp: YtDlp,
    format: String,
    max_duration: u32,
    proxy: Option<String>,
}

impl YtDlpDownloader {
    pub fn new(ytdlp: YtDlp, format: impl Into<String>, max_duration: u32) -> Self {
        Self {
            ytdlp,
            format: format.into(),
            max_duration,
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    fn args(&self, video_id: &str, window: ClipWindow, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            self.format.clone(),
            "--output".to_string(),
            output.to_string_lossy().into_owned(),
            "--force-overwrites".to_string(),
            "--quiet".to_string(),
            "--no-progress".to_string(),
            "--no-part".to_string(),
            "--match-filter".to_string(),
            "!is_live".to_string(),
            "--download-sections".to_string(),
            format!("*{}-{}", window.start(), window.end()),
        ];
        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        args.push(watch_url(video_id));
        args
    }
}

impl Downloader for YtDlpDownloader {
    fn download(
        &self,
        video_id: &str,
        window: ClipWindow,
    ) -> Result<Option<LocalMedia>, DownloadError> {
        validate_id(video_id)?;

        let Some(window) = window.clamp_len(self.max_duration) else {
            return Ok(None);
        };

        let temp = match tempfile::Builder::new()
            .prefix("clipscout-")
            .suffix(".mp4")
            .tempfile()
        {
            Ok(file) => file.into_temp_path(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to create temp file for download");
                return Ok(None);
            }
        };

        let output = match self.ytdlp.run(self.args(video_id, window, &temp)) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(video_id, error = %e, "error downloading video");
                return Ok(None);
            }
        };

        if !output.success {
            let message = output.error_message();
            if let Some(classified) = classify_failure(&message) {
                return Err(classified);
            }
            tracing::warn!(video_id, error = %message, "error downloading video");
            return Ok(None);
        }

        let media = LocalMedia::new(temp);
        if media.size() == 0 {
            tracing::warn!(video_id, path = %media.path().display(), "downloaded file is empty");
            return Ok(None);
        }

        tracing::debug!(
            video_id,
            bytes = media.size(),
            start = window.start(),
            end = window.end(),
            "clip downloaded"
        );
        Ok(Some(media))
    }
}
