//! Checkpoint persistence for normalized patient records.

pub mod checkpoint;
pub mod error;
pub mod snapshot;

pub use checkpoint::{
    CheckpointPolicy, CheckpointSink, DEFAULT_CHECKPOINT_INTERVAL, JsonSnapshotWriter,
};
pub use error::{OutputError, Result};
pub use snapshot::{encode_snapshot, read_snapshot, temp_path, write_snapshot};
