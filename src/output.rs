//! Output file handling.
//!
//! A run's records are written wholesale as one JSON array. Writes go to a
//! sibling temp file first and are renamed into place.

use std::path::Path;

use anyhow::{Context, Result};

use crate::video::types::VideoMetadata;

/// Serialize `records` as a JSON array and atomically replace `path` with it.
pub fn write_records(path: &Path, records: &[VideoMetadata]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string(records).context("failed to serialize records")?;

    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, json)
        .with_context(|| format!("failed to write temp file: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to move output into place: {}", path.display()))?;

    tracing::info!(path = %path.display(), records = records.len(), "output written");
    Ok(())
}

/// Read back an output file written by [`write_records`].
pub fn read_records(path: &Path) -> Result<Vec<VideoMetadata>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array of video records", path.display()))
}
