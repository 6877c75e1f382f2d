//! Back up stale objects under their backup key and replace them with the
//! files fetched by a previous download run.
use std::path::PathBuf;

use common_s3::{S3Client, S3Error};
use media_common::config::FailurePolicy;
use media_common::format::{
    end_line, exists_line, format_last_modified, format_size, missing_line, start_line,
};
use media_common::progress::progress_bar;
use media_common::{
    Identifier, LocationMapper, MediaError, ObjectTimestamp, RunLog, RunSummary, Staleness,
    StalenessClassifier,
};
use tracing::{debug, warn};

pub const VERB: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadMode {
    /// Report existence and staleness only; never write to the bucket.
    CheckOnly,
    Replace {
        downloaded_dir: PathBuf,
        content_type: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Missing,
    Current,
    /// Stale, but left untouched because the run is check-only.
    Stale,
    Replaced,
    NoLocalFile,
    NoTimestamp,
}

pub struct Uploader<C: S3Client> {
    client: C,
    bucket: String,
    mapper: LocationMapper,
    classifier: StalenessClassifier,
    mode: UploadMode,
    policy: FailurePolicy,
}

impl<C: S3Client> Uploader<C> {
    pub fn new(
        client: C,
        bucket: impl Into<String>,
        mapper: LocationMapper,
        classifier: StalenessClassifier,
        mode: UploadMode,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            mapper,
            classifier,
            mode,
            policy,
        }
    }

    pub fn mode(&self) -> &UploadMode {
        &self.mode
    }

    /// Make sure the bucket is reachable before touching any row.
    pub async fn preflight(&self) -> Result<(), MediaError> {
        self.client
            .head_bucket(&self.bucket)
            .await
            .map_err(|e| MediaError::Configuration(e.to_string()))
    }

    pub async fn run(
        &self,
        identifiers: &[Identifier],
        log: &RunLog,
    ) -> Result<RunSummary, MediaError> {
        let total = identifiers.len();
        let mut summary = RunSummary::new(total);

        log.info(start_line(VERB, total));
        let progress = progress_bar(total, "Uploading");

        for identifier in identifiers {
            match self.process(identifier, log).await {
                Ok(UploadOutcome::Missing) => summary.missing += 1,
                Ok(UploadOutcome::Current | UploadOutcome::Stale | UploadOutcome::Replaced) => {
                    summary.succeeded += 1
                }
                Ok(UploadOutcome::NoLocalFile | UploadOutcome::NoTimestamp) => {
                    summary.skipped += 1
                }
                Err(e) => {
                    summary.failed += 1;
                    log.error(format!("Failed to upload {identifier}: {e}"));
                    if e.is_fatal() || self.policy == FailurePolicy::Abort {
                        progress.abandon();
                        log.error(format!(
                            "Aborting {VERB} after {} of {total} files",
                            summary.processed()
                        ));
                        return Err(e);
                    }
                    progress.suspend(|| warn!("Failed to upload {identifier}, continuing"));
                }
            }
            progress.inc(1);
        }

        progress.finish();
        log.info(end_line(VERB, total));
        Ok(summary)
    }

    pub async fn process(
        &self,
        identifier: &Identifier,
        log: &RunLog,
    ) -> Result<UploadOutcome, MediaError> {
        let key = self.mapper.object_key(identifier);
        let uri = format!("s3://{}/{key}", self.bucket);

        let metadata = match self.client.head_object(&self.bucket, &key).await {
            Ok(metadata) => metadata,
            Err(S3Error::NotFound(_)) => {
                log.info(missing_line(&uri));
                return Ok(UploadOutcome::Missing);
            }
            Err(e) => return Err(MediaError::transient(format!("HEAD {uri}"), e)),
        };

        let last_modified = metadata.last_modified.map(ObjectTimestamp::from);
        log.info(exists_line(
            &uri,
            &format_size(metadata.content_length),
            &format_last_modified(last_modified.as_ref()),
            metadata.etag.as_deref(),
        ));

        let cutoff = self.classifier.cutoff();
        let staleness = match self.classifier.classify(&key, last_modified.as_ref()) {
            Ok(staleness) => staleness,
            Err(e @ MediaError::MissingMetadata(_)) => {
                log.error(format!("{e}, skipping"));
                return Ok(UploadOutcome::NoTimestamp);
            }
            Err(e) => return Err(e),
        };

        if staleness == Staleness::Current {
            log.info(format!(
                "Object {key} was modified after {cutoff}, it will NOT be copied."
            ));
            return Ok(UploadOutcome::Current);
        }

        log.info(format!(
            "Object {key} was modified before {cutoff}, it will be copied to a new object key with the backup extension."
        ));

        let UploadMode::Replace {
            downloaded_dir,
            content_type,
        } = &self.mode
        else {
            return Ok(UploadOutcome::Stale);
        };

        let backup_key = self.mapper.backup_object_key(identifier);
        self.client
            .copy_object(&self.bucket, &key, &backup_key)
            .await
            .map_err(|e| {
                MediaError::transient(format!("Failed to copy object {key} to {backup_key}"), e)
            })?;
        log.info(format!(
            "Object {key} was successfully copied to {backup_key}!"
        ));

        let local_path = self.mapper.local_path(downloaded_dir, identifier);
        let is_file = tokio::fs::metadata(&local_path)
            .await
            .is_ok_and(|m| m.is_file());
        if !is_file {
            log.warn(format!(
                "Local file {} does not exist, cannot upload to {key}!",
                local_path.display()
            ));
            return Ok(UploadOutcome::NoLocalFile);
        }

        debug!("Uploading {} as {content_type}", local_path.display());
        self.client
            .put_object_from_file(&self.bucket, &key, &local_path, content_type)
            .await
            .map_err(|e| {
                MediaError::transient(
                    format!("Failed to upload {} to {key}", local_path.display()),
                    e,
                )
            })?;
        log.info(format!(
            "Object {key} was successfully uploaded from {}!",
            local_path.display()
        ));

        Ok(UploadOutcome::Replaced)
    }
}
