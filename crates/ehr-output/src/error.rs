//! Snapshot error types.

use std::path::PathBuf;
use thiserror::Error;

/// Snapshot persistence error.
#[derive(Debug, Error)]
pub enum OutputError {
    /// File I/O error.
    #[error("failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be encoded as JSON.
    #[error("failed to serialize snapshot")]
    Serialize(#[source] serde_json::Error),

    /// A snapshot file is not a JSON array of patient records.
    #[error("failed to parse snapshot {path}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The temp file could not be renamed over the target.
    #[error("failed to replace {target_path} with {temp_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OutputError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Result type for snapshot operations.
pub type Result<T> = std::result::Result<T, OutputError>;
