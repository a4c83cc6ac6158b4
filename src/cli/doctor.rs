//! CLI `doctor` command — check external tools and model files and print a report.

use std::process::{Command, Stdio};

use clipscout::config::{expand_tilde, ClipscoutConfig};
use clipscout::video::ytdlp::{configure_command, YtDlp};

/// Print which external dependencies are available.
pub fn doctor(config: &ClipscoutConfig) {
    println!("clipscout Health Report");
    println!("=======================");
    println!();

    let ytdlp = YtDlp::new(&config.download.ytdlp_path);
    print_tool("yt-dlp", ytdlp.program(), ytdlp.version());

    println!();
    println!("Embedding provider: {}", config.embedding.provider);
    println!("  Model:           {}", config.embedding.model);
    println!("  Dimensions:      {}", config.embedding.dimensions);

    match config.embedding.provider.as_str() {
        "local" => {
            print_tool(
                "ffmpeg",
                &config.embedding.ffmpeg_path,
                tool_version(&config.embedding.ffmpeg_path),
            );
            print_tool(
                "ffprobe",
                &config.embedding.ffprobe_path,
                tool_version(&config.embedding.ffprobe_path),
            );
            let model_dir = expand_tilde(&config.embedding.cache_dir).join(&config.embedding.model);
            for file in ["text.onnx", "vision.onnx", "tokenizer.json"] {
                let path = model_dir.join(file);
                let status = if path.exists() { "OK" } else { "MISSING" };
                println!("  {file:<16} {status} ({})", path.display());
            }
        }
        "remote" => match &config.embedding.endpoint {
            Some(endpoint) => println!("  Endpoint:        {endpoint}"),
            None => println!("  Endpoint:        NOT SET (embedding.endpoint)"),
        },
        other => println!("  WARNING: unknown provider '{other}'. Supported: local, remote"),
    }

    println!();
    println!("Download:");
    println!("  Max clip:        {}s", config.download.max_duration);
    println!("  Format:          {}", config.download.format);
    println!(
        "  Proxy:           {}",
        config.download.proxy.as_deref().unwrap_or("(none)")
    );
}

fn print_tool(name: &str, program: &str, version: Option<String>) {
    match version {
        Some(v) => println!("  {name:<16} OK ({program}, {v})"),
        None => println!("  {name:<16} NOT FOUND ({program})"),
    }
}

/// First line of `<program> -version`, if it runs.
fn tool_version(program: &str) -> Option<String> {
    let mut cmd = Command::new(program);
    cmd.arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    configure_command(&mut cmd);
    let output = cmd.output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
}
