//! Shared building blocks for the media downloader and uploader: turning a
//! `publicId` into URLs, paths and object keys, deciding whether a remote
//! object is stale, and the per-run layout and log.
pub mod config;
pub mod error;
pub mod format;
pub mod identifier;
pub mod log;
pub mod mapper;
pub mod progress;
pub mod records;
pub mod run;
pub mod staleness;

pub use error::MediaError;
pub use identifier::Identifier;
pub use log::RunLog;
pub use mapper::{LocationConfig, LocationMapper};
pub use run::{Run, RunSummary};
pub use staleness::{CutoffDate, ObjectTimestamp, Staleness, StalenessClassifier};
