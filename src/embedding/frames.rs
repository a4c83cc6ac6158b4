//! Frame sampling and preprocessing for the vision tower.
//!
//! Frames are pulled out of a clip with `ffmpeg` as raw RGB, already scaled and
//! center-cropped to a square, then grouped into short clips and normalized into
//! a `[clips, 3, frames, H, W]` tensor.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use ndarray::Array5;

use crate::video::ytdlp::configure_command;

/// Side length of the square frames fed to the vision tower.
pub const FRAME_SIZE: usize = 224;
/// Number of clips sampled from each video.
pub const CLIPS_PER_VIDEO: usize = 5;
/// Frames per clip (temporal depth of the vision input).
pub const FRAMES_PER_CLIP: usize = 2;

/// Per-channel normalization used by CLIP-family vision encoders.
const MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
const STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Pulls evenly spaced RGB frames out of a media file with ffmpeg.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    ffmpeg: String,
    ffprobe: String,
    size: usize,
}

impl FrameSampler {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            size: FRAME_SIZE,
        }
    }

    /// Container duration in seconds.
    pub fn probe_duration(&self, path: &Path) -> Result<f64> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-show_entries", "format=duration", "-of", "csv=p=0"])
            .arg(path)
            .stdin(Stdio::null());
        configure_command(&mut cmd);
        let output = cmd
            .output()
            .with_context(|| format!("failed to run {}", self.ffprobe))?;
        anyhow::ensure!(
            output.status.success(),
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        let text = String::from_utf8_lossy(&output.stdout);
        text.trim()
            .parse::<f64>()
            .with_context(|| format!("unparsable duration {:?}", text.trim()))
    }

    /// Sample `count` frames spread across the file.
    ///
    /// Short files may yield fewer frames; the last one is repeated to fill up.
    pub fn sample(&self, path: &Path, count: usize) -> Result<Vec<Vec<u8>>> {
        let duration = self.probe_duration(path).unwrap_or(0.0);
        let rate = if duration > 0.0 {
            count as f64 / duration
        } else {
            1.0
        };
        let filter = format!(
            "fps={rate:.6},scale={s}:{s}:force_original_aspect_ratio=increase,crop={s}:{s}",
            s = self.size
        );

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-v", "error", "-i"])
            .arg(path)
            .args(["-vf", &filter])
            .args(["-frames:v", &count.to_string()])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null());
        configure_command(&mut cmd);
        let output = cmd
            .output()
            .with_context(|| format!("failed to run {}", self.ffmpeg))?;
        anyhow::ensure!(
            output.status.success(),
            "frame extraction failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );

        let frames = split_frames(&output.stdout, self.size);
        anyhow::ensure!(
            !frames.is_empty(),
            "no frames decoded from {}",
            path.display()
        );
        tracing::debug!(path = %path.display(), decoded = frames.len(), "frames sampled");
        Ok(pad_frames(frames, count))
    }
}

/// Split raw `rgb24` output into whole `size`×`size` frames, dropping a trailing partial frame.
pub fn split_frames(raw: &[u8], size: usize) -> Vec<Vec<u8>> {
    let frame_len = size * size * 3;
    if frame_len == 0 {
        return Vec::new();
    }
    raw.chunks_exact(frame_len).map(<[u8]>::to_vec).collect()
}

/// Repeat the last frame until there are `count` frames; truncate if there are more.
pub fn pad_frames(mut frames: Vec<Vec<u8>>, count: usize) -> Vec<Vec<u8>> {
    frames.truncate(count);
    if let Some(last) = frames.last().cloned() {
        frames.resize(count, last);
    }
    frames
}

/// Build the normalized vision input: consecutive frames grouped into clips.
pub fn clips_tensor(
    frames: &[Vec<u8>],
    size: usize,
    clips: usize,
    frames_per_clip: usize,
) -> Result<Array5<f32>> {
    anyhow::ensure!(
        frames.len() == clips * frames_per_clip,
        "expected {} frames, got {}",
        clips * frames_per_clip,
        frames.len()
    );

    let mut array = Array5::<f32>::zeros((clips, 3, frames_per_clip, size, size));
    for (i, frame) in frames.iter().enumerate() {
        anyhow::ensure!(
            frame.len() == size * size * 3,
            "frame {i} has {} bytes, expected {}",
            frame.len(),
            size * size * 3
        );
        let (clip, t) = (i / frames_per_clip, i % frames_per_clip);
        for y in 0..size {
            for x in 0..size {
                let px = (y * size + x) * 3;
                for c in 0..3 {
                    let value = frame[px + c] as f32 / 255.0;
                    array[[clip, c, t, y, x]] = (value - MEAN[c]) / STD[c];
                }
            }
        }
    }
    Ok(array)
}
