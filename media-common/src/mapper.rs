//! Derives every location of a media item from its identifier.
//!
//! All prefix handling goes through [`LocationMapper::relative_path`], so the
//! path a file is downloaded to and the object key it is later uploaded to
//! always agree.
use std::path::{Path, PathBuf};

use crate::error::MediaError;
use crate::identifier::Identifier;

pub const DEFAULT_TRANSFORMATION_PREFIX: &str = "image/upload/t_hires2/v1";
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";
pub const DEFAULT_BACKUP_EXTENSION: &str = "psd";
pub const DEFAULT_SKIP_PREFIX: &str = "editorial/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationConfig {
    /// Media host, e.g. `https://res.cloudinary.com/<cloud>`. Only needed for
    /// [`LocationMapper::fetch_url`].
    pub base_url: Option<String>,
    pub transformation_prefix: String,
    pub image_extension: String,
    /// Leading segment present in identifiers but not in object keys.
    pub skip_prefix: String,
    pub backup_extension: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            transformation_prefix: DEFAULT_TRANSFORMATION_PREFIX.to_string(),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
            skip_prefix: DEFAULT_SKIP_PREFIX.to_string(),
            backup_extension: DEFAULT_BACKUP_EXTENSION.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocationMapper {
    config: LocationConfig,
}

impl LocationMapper {
    pub fn new(mut config: LocationConfig) -> Self {
        config.base_url = config
            .base_url
            .map(|url| url.trim().trim_end_matches('/').to_string());
        Self { config }
    }

    pub fn config(&self) -> &LocationConfig {
        &self.config
    }

    /// `base_url/transformation_prefix/identifier.ext`. Path segments are not
    /// escaped.
    pub fn fetch_url(&self, identifier: &Identifier) -> Result<String, MediaError> {
        let base_url = match self.config.base_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => {
                return Err(MediaError::Configuration(
                    "base URL of the media host is not set".to_string(),
                ))
            }
        };

        Ok(format!(
            "{base_url}/{}/{identifier}.{}",
            self.config.transformation_prefix, self.config.image_extension
        ))
    }

    /// The identifier with one leading skip-prefix removed, if present.
    pub fn relative_path<'a>(&self, identifier: &'a Identifier) -> &'a str {
        identifier
            .as_str()
            .strip_prefix(self.config.skip_prefix.as_str())
            .unwrap_or(identifier.as_str())
    }

    pub fn local_path(&self, run_dir: &Path, identifier: &Identifier) -> PathBuf {
        run_dir.join(self.object_key(identifier))
    }

    pub fn object_key(&self, identifier: &Identifier) -> String {
        format!(
            "{}.{}",
            self.relative_path(identifier),
            self.config.image_extension
        )
    }

    pub fn backup_object_key(&self, identifier: &Identifier) -> String {
        format!(
            "{}.{}",
            self.relative_path(identifier),
            self.config.backup_extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> Identifier {
        Identifier::new(raw).unwrap()
    }

    fn mapper(base_url: Option<&str>) -> LocationMapper {
        LocationMapper::new(LocationConfig {
            base_url: base_url.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_fetch_url() {
        let mapper = mapper(Some("https://x"));
        assert_eq!(
            mapper.fetch_url(&id("a/b")).unwrap(),
            "https://x/image/upload/t_hires2/v1/a/b.jpg"
        );
    }

    #[test]
    fn test_fetch_url_keeps_skip_prefix() {
        let mapper = mapper(Some("https://x/"));
        assert_eq!(
            mapper.fetch_url(&id("editorial/foo")).unwrap(),
            "https://x/image/upload/t_hires2/v1/editorial/foo.jpg"
        );
    }

    #[test]
    fn test_fetch_url_requires_base_url() {
        assert!(matches!(
            mapper(None).fetch_url(&id("a/b")),
            Err(MediaError::Configuration(_))
        ));
        assert!(matches!(
            mapper(Some("")).fetch_url(&id("a/b")),
            Err(MediaError::Configuration(_))
        ));
        assert!(matches!(
            mapper(Some("/")).fetch_url(&id("a/b")),
            Err(MediaError::Configuration(_))
        ));
    }

    #[test]
    fn test_relative_path_without_prefix_is_unchanged() {
        let mapper = mapper(None);
        for raw in ["bar/baz", "editorial", "editorials/foo", "x/editorial/foo"] {
            assert_eq!(mapper.relative_path(&id(raw)), raw);
        }
    }

    #[test]
    fn test_relative_path_strips_exactly_one_leading_prefix() {
        let mapper = mapper(None);
        assert_eq!(mapper.relative_path(&id("editorial/foo")), "foo");
        assert_eq!(
            mapper.relative_path(&id("editorial/editorial/foo")),
            "editorial/foo"
        );
        assert_eq!(
            mapper.relative_path(&id("editorial/a/editorial/b")),
            "a/editorial/b"
        );
    }

    #[test]
    fn test_relative_path_with_empty_prefix() {
        let mapper = LocationMapper::new(LocationConfig {
            skip_prefix: String::new(),
            ..Default::default()
        });
        assert_eq!(mapper.relative_path(&id("editorial/foo")), "editorial/foo");
    }

    #[test]
    fn test_identifier_equal_to_prefix_strips_to_empty() {
        let mapper = mapper(None);
        assert_eq!(mapper.relative_path(&id("editorial/")), "");
        assert_eq!(mapper.object_key(&id("editorial/")), ".jpg");
    }

    #[test]
    fn test_keys_and_local_paths_agree() {
        let mapper = mapper(None);
        let run_dir = Path::new("data/runs/20260223-054344");

        assert_eq!(mapper.object_key(&id("editorial/foo")), "foo.jpg");
        assert_eq!(mapper.object_key(&id("bar/baz")), "bar/baz.jpg");
        assert_eq!(mapper.backup_object_key(&id("editorial/foo")), "foo.psd");
        assert_eq!(mapper.backup_object_key(&id("bar/baz")), "bar/baz.psd");

        for raw in ["editorial/foo", "bar/baz", "editorial/editorial/x"] {
            let identifier = id(raw);
            assert_eq!(
                mapper.local_path(run_dir, &identifier),
                run_dir.join(mapper.object_key(&identifier))
            );
        }
        assert_eq!(
            mapper.local_path(run_dir, &id("editorial/foo")),
            run_dir.join("foo.jpg")
        );
        assert_eq!(
            mapper.local_path(run_dir, &id("bar/baz")),
            run_dir.join("bar/baz.jpg")
        );
    }

    #[test]
    fn test_extensions_are_configurable() {
        let mapper = LocationMapper::new(LocationConfig {
            base_url: Some("https://x".to_string()),
            image_extension: "png".to_string(),
            backup_extension: "orig".to_string(),
            ..Default::default()
        });
        assert_eq!(mapper.object_key(&id("editorial/foo")), "foo.png");
        assert_eq!(mapper.backup_object_key(&id("editorial/foo")), "foo.orig");
        assert_eq!(
            mapper.fetch_url(&id("a")).unwrap(),
            "https://x/image/upload/t_hires2/v1/a.png"
        );
    }
}
