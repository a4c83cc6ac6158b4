pub mod describe;
pub mod download;
pub mod search;
pub mod types;
pub mod ytdlp;
