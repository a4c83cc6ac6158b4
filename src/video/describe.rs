//! Text description synthesis for a candidate.

use super::types::CandidateDescriptor;

/// Build the text that gets embedded alongside the clip: the title, followed by a
/// blank line and the body text when one exists.
///
/// Richer summarization (transcripts, chapter titles) would slot in here.
pub fn describe(candidate: &CandidateDescriptor) -> String {
    match candidate.description.as_deref() {
        Some(body) if !body.is_empty() => format!("{}\n\n{}", candidate.title, body),
        _ => candidate.title.clone(),
    }
}
