//! Core video type definitions.
//!
//! Defines [`CandidateDescriptor`] (one search hit), [`ClipWindow`] (the time range
//! actually downloaded), [`VideoMetadata`] (a full output record) and
//! [`VideoMetadataSummary`] (the display form of a record).

use serde::{Deserialize, Serialize};

/// Placeholder written in place of embedding vectors in the summary form.
pub const EMBEDDING_PLACEHOLDER: &str = "...";

/// A search hit, as reported by the search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescriptor {
    /// Platform video id (11 characters for well-formed ids).
    pub video_id: String,
    pub title: String,
    /// Body text, when the provider reports one.
    pub description: Option<String>,
    /// Length in whole seconds; the max clip duration when unknown.
    pub duration: u32,
    /// View count; 0 when unknown.
    pub views: u64,
}

/// Half-open `[start, end)` range of a video, in seconds.
///
/// Only constructible with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    start: u32,
    end: u32,
}

impl ClipWindow {
    /// Returns `None` when the range is empty.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Window covering the head of a video: `[0, min(duration, max_duration))`.
    pub fn leading(duration: u32, max_duration: u32) -> Option<Self> {
        Self::new(0, duration.min(max_duration))
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Length in seconds; always positive.
    pub fn duration(&self) -> u32 {
        self.end - self.start
    }

    /// Shrink the window so it spans at most `max_len` seconds.
    pub fn clamp_len(self, max_len: u32) -> Option<Self> {
        Self::new(self.start, self.end.min(self.start.saturating_add(max_len)))
    }
}

/// A fully processed video: description, clip window and both embeddings.
///
/// This is the unit written to the output file. Field names are the output keys.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    /// Title, optionally followed by a blank line and the body text.
    pub description: String,
    pub views: u64,
    /// Clip window start, seconds from the beginning of the video.
    pub start_time: f64,
    /// Clip window end, seconds from the beginning of the video.
    pub end_time: f64,
    /// Media embedding of the downloaded clip.
    pub video_emb: Vec<f32>,
    /// Text embedding of `description`.
    pub description_emb: Vec<f32>,
}

impl VideoMetadata {
    pub fn new(
        candidate: &CandidateDescriptor,
        description: String,
        window: ClipWindow,
        video_emb: Vec<f32>,
        description_emb: Vec<f32>,
    ) -> Self {
        Self {
            video_id: candidate.video_id.clone(),
            description,
            views: candidate.views,
            start_time: f64::from(window.start()),
            end_time: f64::from(window.end()),
            video_emb,
            description_emb,
        }
    }

    /// Display form: embeddings replaced with a placeholder, description shortened.
    pub fn to_summary(&self) -> VideoMetadataSummary {
        VideoMetadataSummary {
            video_id: self.video_id.clone(),
            description: truncate_preview(&self.description, 80),
            views: self.views,
            start_time: self.start_time,
            end_time: self.end_time,
            video_emb: vec![EMBEDDING_PLACEHOLDER],
            description_emb: vec![EMBEDDING_PLACEHOLDER],
        }
    }
}

impl std::fmt::Debug for VideoMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoMetadata")
            .field("video_id", &self.video_id)
            .field("description", &self.description)
            .field("views", &self.views)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("video_emb", &[EMBEDDING_PLACEHOLDER])
            .field("description_emb", &[EMBEDDING_PLACEHOLDER])
            .finish()
    }
}

/// Summary form of a [`VideoMetadata`] for display and logging.
#[derive(Debug, Clone, Serialize)]
pub struct VideoMetadataSummary {
    pub video_id: String,
    pub description: String,
    pub views: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub video_emb: Vec<&'static str>,
    pub description_emb: Vec<&'static str>,
}

impl std::fmt::Display for VideoMetadataSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{:.0}s-{:.0}s] views={} video_emb=[{p}] description_emb=[{p}] {:?}",
            self.video_id,
            self.start_time,
            self.end_time,
            self.views,
            self.description,
            p = EMBEDDING_PLACEHOLDER,
        )
    }
}

/// Truncate to roughly `max_chars` bytes on a char boundary, appending `...`.
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        content.to_string()
    } else {
        let end = content
            .char_indices()
            .take_while(|(i, _)| *i < max_chars)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(max_chars);
        format!("{}...", &content[..end])
    }
}
