//! Error types shared by the storage and export layers.

use thiserror::Error;

/// Failures of the local key/value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("could not encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures of the export pipeline.
///
/// `LibraryUnavailable` and `Library` are recoverable: the pipeline falls
/// back to its secondary method. `NoContent` aborts the export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no preview content found")]
    NoContent,

    #[error("{0} is not available")]
    LibraryUnavailable(&'static str),

    #[error("{library} failed: {message}")]
    Library {
        library: &'static str,
        message: String,
    },

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Whether the pipeline may retry with its secondary method.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ExportError::NoContent)
    }
}

/// Failures loading an [`crate::config::AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
