use std::path::PathBuf;
use thiserror::Error;

/// Why one analysis call produced no result.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Malformed analysis response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Error, Debug)]
pub enum AccessUrlError {
    #[error("No storage credentials are configured for blob {0}")]
    NotConfigured(String),
    #[error("Storage account key is not valid: {0}")]
    InvalidAccountKey(String),
    #[error("Invalid blob url: {0}")]
    Url(#[from] url::ParseError),
    #[error("Blob url {0} cannot hold a path")]
    CannotBeABase(String),
    #[error("SAS validity of {0:?} is out of range")]
    InvalidValidity(std::time::Duration),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Cannot initialize output store {path}: {source}")]
    Initialize {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot append to output store {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum PacingError {
    #[error("Pacing range is inverted: min {min_ms}ms > max {max_ms}ms")]
    InvertedRange { min_ms: u64, max_ms: u64 },
}

/// Failure of one batch item. Never aborts the batch.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Access url issuance failed: {0}")]
    AccessIssuanceFailed(#[source] AccessUrlError),
    #[error("Image analysis failed: {0}")]
    AnalysisFailed(#[source] AnalysisError),
    #[error("Persisting result failed: {0}")]
    PersistenceFailed(#[source] SinkError),
}

/// Failure that ends the whole batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Output store unavailable: {0}")]
    OutputUnavailable(#[from] SinkError),
}
