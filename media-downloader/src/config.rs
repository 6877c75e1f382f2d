use std::path::PathBuf;

use envconfig::Envconfig;
use media_common::config::{EnvMsDuration, FailurePolicy, NonEmptyString};
use media_common::mapper::{
    DEFAULT_IMAGE_EXTENSION, DEFAULT_SKIP_PREFIX, DEFAULT_TRANSFORMATION_PREFIX,
};
use media_common::LocationConfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "CLOUDINARY_BASE_URL")]
    pub base_url: NonEmptyString,

    #[envconfig(default = "image/upload/t_hires2/v1")]
    pub transformation_prefix: String,

    #[envconfig(default = "jpg")]
    pub image_extension: NonEmptyString,

    #[envconfig(default = "editorial/")]
    pub skip_prefix: String,

    #[envconfig(default = "data/export.lite.csv")]
    pub csv_file_path: PathBuf,

    #[envconfig(default = "data")]
    pub data_dir: PathBuf,

    #[envconfig(default = "60000")]
    pub request_timeout: EnvMsDuration,

    #[envconfig(default = "media-downloader/1.0")]
    pub user_agent: String,

    #[envconfig(default = "continue")]
    pub on_error: FailurePolicy,
}

impl Config {
    pub fn location_config(&self) -> LocationConfig {
        LocationConfig {
            base_url: Some(self.base_url.as_str().to_string()),
            transformation_prefix: self.transformation_prefix.clone(),
            image_extension: self.image_extension.as_str().to_string(),
            skip_prefix: self.skip_prefix.clone(),
            ..Default::default()
        }
    }
}
