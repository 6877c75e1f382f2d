//! Download every identifier of a run into its run directory, one request at
//! a time.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use media_common::config::FailurePolicy;
use media_common::format::{end_line, missing_line, start_line};
use media_common::progress::progress_bar;
use media_common::{Identifier, LocationMapper, MediaError, RunLog, RunSummary};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, warn};

pub const VERB: &str = "download";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Written to disk, with its size in bytes.
    Downloaded(u64),
    /// The media host answered 404.
    Missing,
}

pub struct Downloader {
    client: Client,
    mapper: LocationMapper,
    run_dir: PathBuf,
    policy: FailurePolicy,
}

impl Downloader {
    pub fn new(
        mapper: LocationMapper,
        run_dir: PathBuf,
        request_timeout: Duration,
        user_agent: &str,
        policy: FailurePolicy,
    ) -> Result<Self, MediaError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| MediaError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            mapper,
            run_dir,
            policy,
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Download all identifiers in order. Returns early only on a fatal error,
    /// or on any failure when the policy is [`FailurePolicy::Abort`].
    pub fn run(&self, identifiers: &[Identifier], log: &RunLog) -> Result<RunSummary, MediaError> {
        let total = identifiers.len();
        let mut summary = RunSummary::new(total);

        log.info(start_line(VERB, total));
        let progress = progress_bar(total, "Downloading");

        for identifier in identifiers {
            match self.download(identifier, log) {
                Ok(DownloadOutcome::Downloaded(bytes)) => {
                    debug!("Wrote {bytes} bytes for {identifier}");
                    summary.succeeded += 1;
                }
                Ok(DownloadOutcome::Missing) => summary.missing += 1,
                Err(e) => {
                    summary.failed += 1;
                    log.error(format!("Failed to download {identifier}: {e}"));
                    if e.is_fatal() || self.policy == FailurePolicy::Abort {
                        progress.abandon();
                        log.error(format!(
                            "Aborting {VERB} after {} of {total} files",
                            summary.processed()
                        ));
                        return Err(e);
                    }
                    progress.suspend(|| warn!("Failed to download {identifier}, continuing"));
                }
            }
            progress.inc(1);
        }

        progress.finish();
        log.info(end_line(VERB, total));
        Ok(summary)
    }

    pub fn download(
        &self,
        identifier: &Identifier,
        log: &RunLog,
    ) -> Result<DownloadOutcome, MediaError> {
        let url = self.mapper.fetch_url(identifier)?;
        let output_path = self.mapper.local_path(&self.run_dir, identifier);

        log.info(format!("Downloading {identifier}..."));
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| MediaError::transient(format!("GET {url}"), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            log.info(missing_line(&url));
            return Ok(DownloadOutcome::Missing);
        }

        let body = response
            .error_for_status()
            .and_then(|response| response.bytes())
            .map_err(|e| MediaError::transient(format!("GET {url}"), e))?;

        write_file(&output_path, &body)?;
        log.info(format!(
            "Downloaded {identifier} successfully to {}!",
            output_path.display()
        ));

        Ok(DownloadOutcome::Downloaded(body.len() as u64))
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), MediaError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| MediaError::transient(format!("create {}", parent.display()), e))?;
    }
    fs::write(path, contents)
        .map_err(|e| MediaError::transient(format!("write {}", path.display()), e))
}
