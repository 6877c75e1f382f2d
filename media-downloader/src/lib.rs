pub mod config;
pub mod downloader;
