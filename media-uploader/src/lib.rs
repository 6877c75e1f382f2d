pub mod config;
pub mod uploader;
