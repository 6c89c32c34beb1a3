//! Checkpoint cadence and sinks.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use ehr_model::PatientRecord;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::snapshot::write_snapshot;

/// Default number of patients between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 50;

/// How often the working set is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointPolicy {
    pub interval: NonZeroUsize,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            interval: NonZeroUsize::new(DEFAULT_CHECKPOINT_INTERVAL).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl CheckpointPolicy {
    pub fn new(interval: NonZeroUsize) -> Self {
        Self { interval }
    }

    /// Policy for a raw interval; `None` when the interval is zero.
    pub fn every(interval: usize) -> Option<Self> {
        NonZeroUsize::new(interval).map(Self::new)
    }

    /// Whether a checkpoint is due after `processed` patients.
    pub fn is_due(&self, processed: usize) -> bool {
        processed > 0 && processed % self.interval.get() == 0
    }
}

/// Destination for checkpoint snapshots.
///
/// Each call receives the complete working set, so the latest snapshot
/// alone is enough to recover.
pub trait CheckpointSink {
    fn snapshot(&mut self, records: &[PatientRecord]) -> Result<()>;
}

/// Writes every snapshot atomically to one JSON file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotWriter {
    path: PathBuf,
    snapshots_written: usize,
}

impl JsonSnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshots_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshots_written(&self) -> usize {
        self.snapshots_written
    }
}

impl CheckpointSink for JsonSnapshotWriter {
    fn snapshot(&mut self, records: &[PatientRecord]) -> Result<()> {
        write_snapshot(records, &self.path)?;
        self.snapshots_written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_fifty() {
        let policy = CheckpointPolicy::default();
        assert_eq!(policy.interval.get(), 50);
        assert!(!policy.is_due(0));
        assert!(!policy.is_due(49));
        assert!(policy.is_due(50));
        assert!(policy.is_due(100));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(CheckpointPolicy::every(0).is_none());
        assert!(CheckpointPolicy::every(1).is_some_and(|policy| policy.is_due(1)));
    }

    #[test]
    fn writer_counts_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonSnapshotWriter::new(dir.path().join("out.json"));
        writer.snapshot(&[]).unwrap();
        writer.snapshot(&[PatientRecord::new("1")]).unwrap();
        assert_eq!(writer.snapshots_written(), 2);
        assert!(writer.path().is_file());
    }
}
