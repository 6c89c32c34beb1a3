use std::path::PathBuf;

use crate::standard::CodingStandard;

/// Fatal failures while loading vocabulary resources.
#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vocabulary directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("vocabulary file for {standard} not found: {path}")]
    MissingStandard {
        standard: CodingStandard,
        path: PathBuf,
    },

    #[error("cross map {source_standard} -> {target} not found: {path}")]
    MissingCrossMap {
        source_standard: CodingStandard,
        target: CodingStandard,
        path: PathBuf,
    },

    #[error("cross map targets {target} but the vocabulary is {standard}")]
    CrossMapTargetMismatch {
        target: CodingStandard,
        standard: CodingStandard,
    },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("missing required column {column} in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("unknown coding standard: {0}")]
    UnknownStandard(String),

    #[error("{standard} has no hierarchy; cannot truncate to level {depth}")]
    UnsupportedTruncation {
        standard: CodingStandard,
        depth: usize,
    },

    #[error("{standard} hierarchy has {max} levels; requested level {depth}")]
    DepthOutOfRange {
        standard: CodingStandard,
        depth: usize,
        max: usize,
    },
}

impl VocabError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, error: &csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// A code that has no entry in its vocabulary.
///
/// This is the non-fatal outcome of a lookup: callers keep the original
/// code and carry on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("code {code} could not be found in {standard}")]
pub struct UnmappedCode {
    pub standard: CodingStandard,
    pub code: String,
}

impl UnmappedCode {
    pub fn new(standard: CodingStandard, code: impl Into<String>) -> Self {
        Self {
            standard,
            code: code.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VocabError>;
