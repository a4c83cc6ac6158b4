//! Thin wrapper around the `yt-dlp` executable.
//!
//! Both the search and download providers shell out through [`YtDlp`], so
//! argument plumbing and failure capture live in one place.

use std::ffi::OsStr;
use std::process::{Command, Output, Stdio};

/// Base URL for watch pages; the video id is appended.
pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Captured result of a finished `yt-dlp` invocation.
#[derive(Debug)]
pub struct YtDlpOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for YtDlpOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl YtDlpOutput {
    /// The most useful failure text: `ERROR:` lines from stderr, else all of stderr.
    pub fn error_message(&self) -> String {
        let errors: Vec<&str> = self
            .stderr
            .lines()
            .filter(|line| line.starts_with("ERROR:"))
            .collect();
        if errors.is_empty() {
            self.stderr.trim().to_string()
        } else {
            errors.join("\n")
        }
    }
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run `yt-dlp` to completion with the given arguments.
    ///
    /// Only a failure to spawn is an `Err`; a non-zero exit is reported through
    /// [`YtDlpOutput::success`].
    pub fn run<I, S>(&self, args: I) -> std::io::Result<YtDlpOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure_command(&mut cmd);
        let output = cmd.output()?;
        Ok(output.into())
    }

    /// `yt-dlp --version`, if the executable can be run.
    pub fn version(&self) -> Option<String> {
        let output = self.run(["--version"]).ok()?;
        output.success.then(|| output.stdout.trim().to_string())
    }
}

/// Apply platform-specific flags so no console window flashes up on Windows.
pub fn configure_command(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

/// Full watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL}{video_id}")
}
