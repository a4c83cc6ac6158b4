use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Query used when neither config, env nor flags provide one.
pub const DEFAULT_QUERY: &str = "omega";
/// Number of records a run collects by default.
pub const DEFAULT_TARGET_COUNT: usize = 8;
/// Output file written by `clipscout run`.
pub const DEFAULT_OUTPUT_PATH: &str = "sample_output.txt";
/// Longest clip window ever downloaded, in seconds (two minutes).
pub const MAX_DURATION: u32 = 120;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ClipscoutConfig {
    pub log: LogConfig,
    pub run: RunConfig,
    pub download: DownloadConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

/// What the pipeline does when a download is classified as blocked.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockedPolicy {
    /// Drop the candidate and continue with the next one.
    Skip,
    /// End the run with an error; no output is written.
    Abort,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub query: String,
    pub target_count: usize,
    pub overfetch_factor: f64,
    pub on_blocked: BlockedPolicy,
    pub output_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DownloadConfig {
    pub ytdlp_path: String,
    pub max_duration: u32,
    pub format: String,
    pub proxy: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    pub dimensions: usize,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.into(),
            target_count: DEFAULT_TARGET_COUNT,
            overfetch_factor: 1.5,
            on_blocked: BlockedPolicy::Skip,
            output_path: DEFAULT_OUTPUT_PATH.into(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".into(),
            max_duration: MAX_DURATION,
            format: "worst".into(),
            proxy: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_clipscout_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "imagebind-huge".into(),
            cache_dir,
            dimensions: 1024,
            ffmpeg_path: "ffmpeg".into(),
            ffprobe_path: "ffprobe".into(),
            endpoint: None,
            timeout_secs: 120,
        }
    }
}

/// Returns `~/.clipscout/`, or `./.clipscout/` when no home directory is known.
pub fn default_clipscout_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clipscout")
}

/// Returns the default config file path: `~/.clipscout/config.toml`
pub fn default_config_path() -> PathBuf {
    default_clipscout_dir().join("config.toml")
}

/// Command-line values that take precedence over the file and environment.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub query: Option<String>,
    pub target_count: Option<usize>,
    pub output_path: Option<PathBuf>,
}

impl ClipscoutConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_with(default_config_path(), RunOverrides::default())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, RunOverrides::default())
    }

    /// Like [`load_from`](Self::load_from), with `overrides` applied last.
    ///
    /// Validation runs on the merged result, so a flag can repair a bad file value.
    pub fn load_with(path: impl AsRef<Path>, overrides: RunOverrides) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ClipscoutConfig::default()
        };

        config.apply_env_overrides();
        config.apply_run_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_run_overrides(&mut self, overrides: RunOverrides) {
        if let Some(query) = overrides.query {
            self.run.query = query;
        }
        if let Some(count) = overrides.target_count {
            self.run.target_count = count;
        }
        if let Some(output) = overrides.output_path {
            self.run.output_path = output.to_string_lossy().into_owned();
        }
    }

    /// Apply environment variable overrides (CLIPSCOUT_LOG_LEVEL, CLIPSCOUT_PROXY,
    /// CLIPSCOUT_OUTPUT, CLIPSCOUT_EMBEDDING_ENDPOINT).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CLIPSCOUT_LOG_LEVEL") {
            self.log.level = val;
        }
        if let Ok(val) = std::env::var("CLIPSCOUT_PROXY") {
            self.download.proxy = Some(val);
        }
        if let Ok(val) = std::env::var("CLIPSCOUT_OUTPUT") {
            self.run.output_path = val;
        }
        if let Ok(val) = std::env::var("CLIPSCOUT_EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = Some(val);
        }
    }

    /// Reject settings the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.run.overfetch_factor >= 1.0 && self.run.overfetch_factor.is_finite(),
            "run.overfetch_factor must be >= 1.0, got {}",
            self.run.overfetch_factor
        );
        anyhow::ensure!(self.run.target_count > 0, "run.target_count must be > 0");
        anyhow::ensure!(
            self.download.max_duration > 0,
            "download.max_duration must be > 0"
        );
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding.dimensions must be > 0"
        );
        Ok(())
    }

    /// Resolve the output path, expanding `~` if needed.
    pub fn resolved_output_path(&self) -> PathBuf {
        expand_tilde(&self.run.output_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
