//! CLI `run` command — search, download, embed, and write the output file.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use clipscout::config::ClipscoutConfig;
use clipscout::output;
use clipscout::pipeline::Pipeline;

/// Run the full pipeline with the given config and write the output file.
pub async fn run(config: ClipscoutConfig) -> Result<()> {
    let output_path = config.resolved_output_path();
    let query = config.run.query.clone();
    let target = config.run.target_count;

    println!("Collecting {target} clip(s) for query '{query}'...");

    let run_output = tokio::task::spawn_blocking(move || {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {pos}/{len} candidates ({eta})")
                .expect("valid template")
                .progress_chars("##-"),
        );
        let pipeline = Pipeline::from_config(&config)?.with_progress(pb);
        pipeline.search_and_embed(&query, target)
    })
    .await?
    .context("run failed")?;

    output::write_records(&output_path, &run_output.records)?;

    println!("{}", run_output.report);
    println!("Wrote {} to {}", run_output.records.len(), output_path.display());
    Ok(())
}
