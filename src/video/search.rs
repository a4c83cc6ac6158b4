//! Search step — turn a free-text query into an ordered list of candidates.
//!
//! [`SearchProvider`] is the seam the pipeline consumes; [`YtDlpSearch`] is the
//! production implementation, running `yt-dlp` in flat-search mode.

use serde::Deserialize;

use super::types::CandidateDescriptor;
use super::ytdlp::YtDlp;

/// Source of candidate videos for a query.
///
/// Implementations never fail: a provider-level error is logged and reported as an
/// empty list, which callers treat as "no results".
pub trait SearchProvider: Send + Sync {
    /// Return up to `count` candidates in provider ranking order, live broadcasts excluded.
    fn search(&self, query: &str, count: usize) -> Vec<CandidateDescriptor>;
}

/// Number of candidates to request so that `target` records survive attrition.
///
/// Always at least `target`.
pub fn overfetch_count(target: usize, factor: f64) -> usize {
    // Small epsilon keeps 10 * 1.1 from rounding up to 12.
    let wanted = (target as f64 * factor - 1e-9).ceil();
    if wanted.is_finite() && wanted > target as f64 {
        wanted as usize
    } else {
        target
    }
}

/// Searches through `yt-dlp "ytsearchN:<query>"`.
#[derive(Debug, Clone)]
pub struct YtDlpSearch {
    ytdlp: YtDlp,
    max_duration: u32,
}

impl YtDlpSearch {
    /// `max_duration` stands in for entries that report no duration.
    pub fn new(ytdlp: YtDlp, max_duration: u32) -> Self {
        Self {
            ytdlp,
            max_duration,
        }
    }

    fn args(query: &str, count: usize) -> Vec<String> {
        vec![
            "--dump-single-json".into(),
            "--flat-playlist".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--match-filter".into(),
            "!is_live".into(),
            format!("ytsearch{count}:{query}"),
        ]
    }
}

impl SearchProvider for YtDlpSearch {
    fn search(&self, query: &str, count: usize) -> Vec<CandidateDescriptor> {
        if count == 0 {
            return Vec::new();
        }

        let output = match self.ytdlp.run(Self::args(query, count)) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(error = %e, program = self.ytdlp.program(), "error searching for videos");
                return Vec::new();
            }
        };

        if !output.success {
            tracing::warn!(error = %output.error_message(), "error searching for videos");
            return Vec::new();
        }

        match parse_search_results(&output.stdout, self.max_duration) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "unparsable search response");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    entries: Option<Vec<SearchEntry>>,
}

#[derive(Debug, Deserialize)]
struct SearchEntry {
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    is_live: Option<bool>,
    #[serde(default)]
    live_status: Option<String>,
}

impl SearchEntry {
    fn is_live(&self) -> bool {
        self.is_live == Some(true)
            || matches!(self.live_status.as_deref(), Some("is_live" | "is_upcoming"))
    }
}

/// Parse the single JSON document printed by `yt-dlp --dump-single-json`.
///
/// Entries without an id or flagged as live are dropped. Missing or zero durations
/// fall back to `max_duration`; known durations are truncated to whole seconds.
/// Missing view counts fall back to 0.
pub fn parse_search_results(
    json: &str,
    max_duration: u32,
) -> serde_json::Result<Vec<CandidateDescriptor>> {
    let response: SearchResponse = serde_json::from_str(json)?;
    let candidates = response
        .entries
        .unwrap_or_default()
        .into_iter()
        .filter(|entry| !entry.is_live())
        .filter_map(|entry| {
            let duration = match entry.duration {
                Some(d) if d > 0.0 => d.min(u32::MAX as f64) as u32,
                _ => max_duration,
            };
            Some(CandidateDescriptor {
                video_id: entry.id?,
                title: entry.title.unwrap_or_default(),
                description: entry.description,
                duration,
                views: entry.view_count.unwrap_or(0),
            })
        })
        .collect();
    Ok(candidates)
}
