use anyhow::Result;

use clipscout::config::ClipscoutConfig;
use clipscout::video::search::{SearchProvider, YtDlpSearch};
use clipscout::video::types::truncate_preview;
use clipscout::video::ytdlp::YtDlp;

/// List search candidates for a query from the terminal.
pub async fn search(config: &ClipscoutConfig, query: &str, count: usize) -> Result<()> {
    let provider = YtDlpSearch::new(
        YtDlp::new(&config.download.ytdlp_path),
        config.download.max_duration,
    );

    let query_text = query.to_string();
    let candidates =
        tokio::task::spawn_blocking(move || provider.search(&query_text, count)).await?;

    if candidates.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} candidate(s)\n", candidates.len());

    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "  {}. {} ({}s, {} views)",
            i + 1,
            candidate.video_id,
            candidate.duration,
            candidate.views,
        );
        println!("     {}", truncate_preview(&candidate.title, 120));
        println!();
    }

    Ok(())
}
