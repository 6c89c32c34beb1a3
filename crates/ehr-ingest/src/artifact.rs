//! Split artifact discovery and reading.
//!
//! A dataset root holds either three pre-split artifacts
//! (`train.json`, `validation.json`, `test.json`) or a single
//! `patients.json` with every record. Each artifact is a JSON array of
//! record objects.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ehr_model::Partition;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{IngestError, Result};

/// A patient record as stored upstream, before projection.
pub type RawRecord = Map<String, Value>;

/// File holding every record when no pre-split artifacts exist.
pub const ALL_RECORDS_FILE: &str = "patients.json";

/// Artifact file name for a partition.
pub fn partition_file(partition: Partition) -> String {
    format!("{}.json", partition.as_str())
}

/// How the records under a dataset root are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLayout {
    /// Three pre-split artifacts; used as-is.
    PreSplit {
        train: PathBuf,
        validation: PathBuf,
        test: PathBuf,
    },
    /// One artifact to be split deterministically.
    Combined(PathBuf),
}

impl ArtifactLayout {
    pub fn is_pre_split(&self) -> bool {
        matches!(self, ArtifactLayout::PreSplit { .. })
    }
}

/// Inspect a dataset root and decide which artifacts to read.
///
/// Pre-split artifacts win over `patients.json`. A partial set of
/// pre-split artifacts without `patients.json` is an error.
pub fn discover_artifacts(root: &Path) -> Result<ArtifactLayout> {
    if !root.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let split_paths: Vec<(Partition, PathBuf)> = Partition::ALL
        .into_iter()
        .map(|partition| (partition, root.join(partition_file(partition))))
        .collect();
    let missing: Vec<String> = split_paths
        .iter()
        .filter(|(_, path)| !path.is_file())
        .map(|(partition, _)| partition_file(*partition))
        .collect();

    if missing.is_empty() {
        let mut paths = split_paths.into_iter().map(|(_, path)| path);
        if let (Some(train), Some(validation), Some(test)) =
            (paths.next(), paths.next(), paths.next())
        {
            return Ok(ArtifactLayout::PreSplit {
                train,
                validation,
                test,
            });
        }
    }

    let combined = root.join(ALL_RECORDS_FILE);
    if combined.is_file() {
        return Ok(ArtifactLayout::Combined(combined));
    }

    if missing.len() < Partition::ALL.len() {
        return Err(IngestError::IncompleteSplit {
            path: root.to_path_buf(),
            missing: missing.join(", "),
        });
    }
    Err(IngestError::NoArtifacts {
        path: root.to_path_buf(),
    })
}

/// Read one artifact.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let records: Vec<RawRecord> = serde_json::from_reader(BufReader::new(file)).map_err(
        |source| IngestError::JsonParse {
            path: path.to_path_buf(),
            source,
        },
    )?;
    debug!(
        path = %path.display(),
        record_count = records.len(),
        "artifact read"
    );
    Ok(records)
}
