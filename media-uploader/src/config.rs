use std::path::PathBuf;

use common_s3::S3Config;
use envconfig::Envconfig;
use media_common::config::{EnvMsDuration, FailurePolicy, NonEmptyString};
use media_common::run::latest_run_dir;
use media_common::{CutoffDate, LocationConfig, MediaError};

use crate::uploader::UploadMode;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "AWS_S3_BUCKET_NAME")]
    pub bucket_name: NonEmptyString,

    #[envconfig(default = "jpg")]
    pub image_extension: NonEmptyString,

    #[envconfig(default = "psd")]
    pub backup_extension: NonEmptyString,

    #[envconfig(default = "editorial/")]
    pub skip_prefix: String,

    #[envconfig(default = "data/export.lite.csv")]
    pub csv_file_path: PathBuf,

    #[envconfig(default = "data")]
    pub data_dir: PathBuf,

    /// Run folder of a previous download. Defaults to the latest one.
    pub downloaded_files_path: Option<PathBuf>,

    #[envconfig(from = "OBJECT_MODIFIED_DATE_LIMIT", default = "2026-01-01")]
    pub modified_date_limit: CutoffDate,

    #[envconfig(default = "image/jpeg")]
    pub upload_content_type: String,

    #[envconfig(default = "false")]
    pub check_only: bool,

    #[envconfig(default = "continue")]
    pub on_error: FailurePolicy,

    #[envconfig(default = "us-east-1")]
    pub aws_region: String,

    pub aws_endpoint_url: Option<String>,

    #[envconfig(default = "false")]
    pub aws_force_path_style: bool,

    #[envconfig(default = "60000")]
    pub s3_operation_timeout: EnvMsDuration,
}

impl Config {
    pub fn location_config(&self) -> LocationConfig {
        LocationConfig {
            base_url: None,
            image_extension: self.image_extension.as_str().to_string(),
            skip_prefix: self.skip_prefix.clone(),
            backup_extension: self.backup_extension.as_str().to_string(),
            ..Default::default()
        }
    }

    pub fn s3_config(&self) -> S3Config {
        S3Config {
            region: self.aws_region.clone(),
            endpoint: self.aws_endpoint_url.clone(),
            force_path_style: self.aws_force_path_style,
            operation_timeout: self.s3_operation_timeout.0,
        }
    }

    /// Resolve where replacement files are read from. Fails if there is
    /// nothing to upload from and the run isn't check-only.
    pub fn upload_mode(&self) -> Result<UploadMode, MediaError> {
        if self.check_only {
            return Ok(UploadMode::CheckOnly);
        }

        let downloaded_dir = match &self.downloaded_files_path {
            Some(path) => path.clone(),
            None => latest_run_dir(&self.data_dir)?.ok_or_else(|| {
                MediaError::Configuration(format!(
                    "DOWNLOADED_FILES_PATH is not set and there is no run under {}",
                    self.data_dir.join("runs").display()
                ))
            })?,
        };

        if !downloaded_dir.is_dir() {
            return Err(MediaError::Configuration(format!(
                "downloaded files path {} is not a directory",
                downloaded_dir.display()
            )));
        }

        Ok(UploadMode::Replace {
            downloaded_dir,
            content_type: self.upload_content_type.clone(),
        })
    }
}
