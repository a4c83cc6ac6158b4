mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clipscout::config;

#[derive(Parser)]
#[command(
    name = "clipscout",
    version,
    about = "Search videos, download short clips, and compute joint video/text embeddings"
)]
struct Cli {
    /// Config file (defaults to ~/.clipscout/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search, download, embed, and write the output file
    Run {
        /// Search query
        #[arg(long)]
        query: Option<String>,
        /// Number of records to collect
        #[arg(long)]
        count: Option<usize>,
        /// Output file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List search candidates without downloading anything
    Search {
        query: String,
        /// Number of candidates to request
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Print the summary form of every record in an output file
    Inspect { path: PathBuf },
    /// Check that yt-dlp, ffmpeg and the embedding model are available
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = match &cli.command {
        Command::Run {
            query,
            count,
            output,
        } => config::RunOverrides {
            query: query.clone(),
            target_count: *count,
            output_path: output.clone(),
        },
        _ => config::RunOverrides::default(),
    };
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let config = config::ClipscoutConfig::load_with(&config_path, overrides)?;

    // Log to stderr so stdout stays clean for command output.
    let filter =
        EnvFilter::try_new(&config.log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run { .. } => {
            cli::run::run(config).await?;
        }
        Command::Search { query, count } => {
            cli::search::search(&config, &query, count).await?;
        }
        Command::Inspect { path } => {
            cli::inspect::inspect(&path)?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config);
        }
    }

    Ok(())
}
