//! Snapshot files.
//!
//! A snapshot is the whole working set as one pretty-printed JSON array
//! (4-space indent, UTF-8, non-ASCII left unescaped). It is written to
//! `<path>.tmp` and renamed over `<path>`, so a reader never sees a
//! partially written document.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use ehr_model::PatientRecord;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::{OutputError, Result};

const INDENT: &[u8] = b"    ";

/// Temp file used while a snapshot of `path` is being written.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Encode records the way snapshots store them.
pub fn encode_snapshot(records: &[PatientRecord]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records
        .serialize(&mut serializer)
        .map_err(OutputError::Serialize)?;
    Ok(buffer)
}

/// Atomically replace `path` with a snapshot of `records`.
///
/// Parent directories are created as needed.
pub fn write_snapshot(records: &[PatientRecord], path: &Path) -> Result<()> {
    let bytes = encode_snapshot(records)?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OutputError::io("create directory", parent, e))?;
    }

    let temp_path = temp_path(path);
    if let Err(error) = write_and_rename(&bytes, &temp_path, path) {
        // The target is untouched; only the partial temp file needs to go.
        let _ = fs::remove_file(&temp_path);
        return Err(error);
    }

    tracing::debug!(
        path = %path.display(),
        record_count = records.len(),
        bytes = bytes.len(),
        "snapshot written"
    );
    Ok(())
}

fn write_and_rename(bytes: &[u8], temp_path: &Path, path: &Path) -> Result<()> {
    let mut file =
        File::create(temp_path).map_err(|e| OutputError::io("create", temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| OutputError::io("write", temp_path, e))?;
    file.sync_all()
        .map_err(|e| OutputError::io("sync", temp_path, e))?;
    drop(file);

    fs::rename(temp_path, path).map_err(|e| OutputError::AtomicWriteFailed {
        temp_path: temp_path.to_path_buf(),
        target_path: path.to_path_buf(),
        source: e,
    })
}

/// Read a snapshot back.
pub fn read_snapshot(path: &Path) -> Result<Vec<PatientRecord>> {
    let file = File::open(path).map_err(|e| OutputError::io("read", path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| OutputError::Deserialize {
        path: path.to_path_buf(),
        source,
    })
}
