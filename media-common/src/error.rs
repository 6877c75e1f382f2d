use thiserror::Error;

/// Enumeration of errors that can occur while preparing or processing a run.
///
/// `Configuration`, `MissingColumn`, `Csv` and `Io` are fatal and raised before
/// any row is processed. The others are per-row.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("identifier is empty")]
    InvalidIdentifier,
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("{context}: {source}")]
    TransientIo {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    #[error("cannot determine staleness of {0}: no last-modified timestamp")]
    MissingMetadata(String),
    #[error("CSV must contain a '{0}' column")]
    MissingColumn(String),
    #[error("failed to parse CSV")]
    Csv(#[from] csv::Error),
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl MediaError {
    pub fn transient(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        MediaError::TransientIo {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        MediaError::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether this error must stop the run regardless of the failure policy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MediaError::Configuration(_)
                | MediaError::MissingColumn(_)
                | MediaError::Csv(_)
                | MediaError::Io { .. }
        )
    }
}
