//! S3 client abstraction for the media tools
//!
//! This crate wraps the handful of object operations the uploader needs
//! (HEAD, same-bucket copy, upload from a local file) behind a trait, so the
//! workflow can be tested against a mock and errors are classified the same
//! way everywhere. [`MockS3Client`] is always compiled so downstream crates
//! can use it in their tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as AwsS3SdkClient;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum S3Error {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("S3 operation failed: {0}")]
    OperationFailed(String),
    #[error("Local file error: {0}")]
    LocalFile(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Attributes returned by a HEAD request, without the body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_length: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub checksum: Option<String>,
}

impl TryFrom<HeadObjectOutput> for ObjectMetadata {
    type Error = S3Error;

    fn try_from(head: HeadObjectOutput) -> Result<Self, Self::Error> {
        let last_modified = head
            .last_modified()
            .map(|lm| {
                DateTime::from_timestamp(lm.secs(), lm.subsec_nanos()).ok_or_else(|| {
                    S3Error::ParseError(format!("LastModified out of range: {}", lm.secs()))
                })
            })
            .transpose()?;

        Ok(Self {
            content_length: head
                .content_length()
                .and_then(|len| u64::try_from(len).ok()),
            last_modified,
            etag: head.e_tag().map(str::to_string),
            content_type: head.content_type().map(str::to_string),
            checksum: head
                .checksum_sha256()
                .or(head.checksum_crc32())
                .map(str::to_string),
        })
    }
}

/// Connection settings for [`create_s3_client`].
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub endpoint: Option<String>,
    pub force_path_style: bool,
    pub operation_timeout: Duration,
}

pub async fn create_s3_client(config: &S3Config) -> AwsS3SdkClient {
    let timeout_config = TimeoutConfig::builder()
        .operation_timeout(config.operation_timeout)
        .build();

    let shared_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    let mut builder = aws_sdk_s3::config::Builder::from(&shared_config)
        .timeout_config(timeout_config)
        .force_path_style(config.force_path_style);

    if let Some(ref endpoint) = config.endpoint {
        info!("Using custom S3 endpoint {endpoint}");
        builder = builder.endpoint_url(endpoint);
    }

    AwsS3SdkClient::from_conf(builder.build())
}

/// Percent-encode each segment of a key, keeping the `/` separators, as
/// required by the `x-amz-copy-source` header.
pub fn encode_copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{bucket}/{}", encoded.join("/"))
}

/// S3 client trait that both real and mock implementations use
#[async_trait]
pub trait S3Client: Send + Sync {
    /// Check that the bucket exists and is reachable with the current credentials
    async fn head_bucket(&self, bucket: &str) -> Result<(), S3Error>;

    /// Fetch an object's metadata without downloading it
    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, S3Error>;

    /// Copy an object to another key in the same bucket
    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), S3Error>;

    /// Upload a local file, replacing whatever is stored at `key`
    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), S3Error>;
}

/// Real S3 client implementation
pub struct S3Impl {
    client: AwsS3SdkClient,
}

impl S3Impl {
    pub fn new(client: AwsS3SdkClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl S3Client for S3Impl {
    async fn head_bucket(&self, bucket: &str) -> Result<(), S3Error> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                S3Error::OperationFailed(format!(
                    "S3 bucket validation failed for '{bucket}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        info!("S3 bucket '{bucket}' validated successfully");
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, S3Error> {
        debug!("HEAD s3://{bucket}/{key}");
        let head_object_output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let error_message = format!(
                    "Failed to head object s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&e)
                );
                let status = e.raw_response().map(|r| r.status().as_u16());
                if status == Some(404)
                    || matches!(e.into_service_error(), HeadObjectError::NotFound(_))
                {
                    S3Error::NotFound(key.to_string())
                } else {
                    S3Error::OperationFailed(error_message)
                }
            })?;

        ObjectMetadata::try_from(head_object_output)
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), S3Error> {
        debug!("COPY s3://{bucket}/{source_key} -> s3://{bucket}/{destination_key}");
        self.client
            .copy_object()
            .bucket(bucket)
            .key(destination_key)
            .copy_source(encode_copy_source(bucket, source_key))
            .send()
            .await
            .map_err(|e| {
                S3Error::OperationFailed(format!(
                    "Failed to copy s3://{bucket}/{source_key} to {destination_key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), S3Error> {
        let body = tokio::fs::read(path).await.map_err(|e| {
            S3Error::LocalFile(format!("Failed to read file {}: {e}", path.display()))
        })?;

        debug!("PUT {} -> s3://{bucket}/{key}", path.display());
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                S3Error::OperationFailed(format!(
                    "Failed to upload to s3://{bucket}/{key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }
}

/// A call observed by [`MockS3Client`], in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S3Call {
    HeadBucket {
        bucket: String,
    },
    Head {
        bucket: String,
        key: String,
    },
    Copy {
        bucket: String,
        source_key: String,
        destination_key: String,
    },
    Put {
        bucket: String,
        key: String,
        path: PathBuf,
        content_type: String,
    },
}

/// Mock S3 client for testing - always available, no conditional compilation needed
#[derive(Clone, Default)]
pub struct MockS3Client {
    missing_buckets: Vec<String>,
    head_object_responses: HashMap<String, Result<ObjectMetadata, S3Error>>,
    copy_object_failures: HashMap<String, S3Error>,
    put_object_failures: HashMap<String, S3Error>,
    calls: Arc<Mutex<Vec<S3Call>>>,
}

impl MockS3Client {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make head_bucket() fail for `bucket`. Every other bucket exists.
    pub fn missing_bucket(mut self, bucket: &str) -> Self {
        self.missing_buckets.push(bucket.to_string());
        self
    }

    /// Set up a response for head_object(). Unconfigured keys are NotFound.
    pub fn head_object_ret(
        mut self,
        bucket: &str,
        key: &str,
        response: Result<ObjectMetadata, S3Error>,
    ) -> Self {
        self.head_object_responses
            .insert(format!("{bucket}:{key}"), response);
        self
    }

    /// Make copy_object() fail when copying *to* `destination_key`.
    pub fn copy_object_err(mut self, bucket: &str, destination_key: &str, err: S3Error) -> Self {
        self.copy_object_failures
            .insert(format!("{bucket}:{destination_key}"), err);
        self
    }

    /// Make put_object_from_file() fail for `key`.
    pub fn put_object_err(mut self, bucket: &str, key: &str, err: S3Error) -> Self {
        self.put_object_failures
            .insert(format!("{bucket}:{key}"), err);
        self
    }

    /// Every call made so far, shared between clones of this mock.
    pub fn calls(&self) -> Vec<S3Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: S3Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

#[async_trait]
impl S3Client for MockS3Client {
    async fn head_bucket(&self, bucket: &str) -> Result<(), S3Error> {
        self.record(S3Call::HeadBucket {
            bucket: bucket.to_string(),
        });
        if self.missing_buckets.iter().any(|b| b == bucket) {
            return Err(S3Error::OperationFailed(format!(
                "S3 bucket validation failed for '{bucket}'"
            )));
        }
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, S3Error> {
        self.record(S3Call::Head {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        match self.head_object_responses.get(&format!("{bucket}:{key}")) {
            Some(response) => response.clone(),
            None => Err(S3Error::NotFound(key.to_string())),
        }
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source_key: &str,
        destination_key: &str,
    ) -> Result<(), S3Error> {
        self.record(S3Call::Copy {
            bucket: bucket.to_string(),
            source_key: source_key.to_string(),
            destination_key: destination_key.to_string(),
        });
        match self
            .copy_object_failures
            .get(&format!("{bucket}:{destination_key}"))
        {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> Result<(), S3Error> {
        self.record(S3Call::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
            path: path.to_path_buf(),
            content_type: content_type.to_string(),
        });
        if let Some(err) = self.put_object_failures.get(&format!("{bucket}:{key}")) {
            return Err(err.clone());
        }
        if !tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
            return Err(S3Error::LocalFile(format!(
                "{} is not a readable file",
                path.display()
            )));
        }
        Ok(())
    }
}
