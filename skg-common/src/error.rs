use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SkgError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Cache Error: {0}")]
    Cache(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("Checksum Mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Extraction Error: {0}")]
    ExtractionError(String),

    #[error("Parsing Error in {0}: {1}")]
    ParseError(&'static str, String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl From<std::io::Error> for SkgError {
    fn from(err: std::io::Error) -> Self {
        SkgError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for SkgError {
    fn from(err: reqwest::Error) -> Self {
        SkgError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for SkgError {
    fn from(err: serde_json::Error) -> Self {
        SkgError::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, SkgError>;
