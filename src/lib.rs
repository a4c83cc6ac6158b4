//! Search a video platform, download short clips, and embed them alongside their text.
//!
//! clipscout runs a query against the platform's search, overfetches candidates to
//! absorb failures, downloads a bounded low-quality clip of each, and embeds the clip
//! and its title/description into a shared vector space. The collected records are
//! written to a single JSON file.
//!
//! # Architecture
//!
//! - **Search / download**: the `yt-dlp` executable, driven as a subprocess
//! - **Embeddings**: an ImageBind-style ONNX export via ONNX Runtime, or an HTTP
//!   inference server
//! - **Orchestration**: strictly sequential; one clip on disk at a time
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`video`] — Candidate types, search, download, and description synthesis
//! - [`embedding`] — Joint text/video embedding providers
//! - [`pipeline`] — The search → download → embed loop
//! - [`output`] — Reading and writing the JSON output file

pub mod config;
pub mod embedding;
pub mod output;
pub mod pipeline;
pub mod video;
