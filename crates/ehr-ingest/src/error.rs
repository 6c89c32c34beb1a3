//! Error types for cohort loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a cohort.
///
/// All of these are fatal: the pipeline does not run without its input.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Dataset root not found or not a directory.
    #[error("dataset directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Neither pre-split artifacts nor an all-records artifact exist.
    #[error("no split artifacts in {path} (expected train/validation/test.json or patients.json)")]
    NoArtifacts { path: PathBuf },

    /// Some but not all pre-split artifacts exist.
    #[error("incomplete split in {path}: missing {missing}")]
    IncompleteSplit { path: PathBuf, missing: String },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact is not a JSON array of objects.
    #[error("failed to parse JSON {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A record cannot be projected (missing id or malformed domain).
    #[error("invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Split ratios are negative or do not sum to one.
    #[error("invalid split ratios {ratios:?}: {reason}")]
    InvalidRatios { ratios: [f64; 3], reason: String },
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
