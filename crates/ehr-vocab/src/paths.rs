//! Vocabulary directory resolution.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the vocabulary directory.
pub const VOCAB_ENV_VAR: &str = "EHR_VOCAB_DIR";

/// Resolve the vocabulary directory.
///
/// Resolution order:
/// 1. an explicit path (CLI flag or config file)
/// 2. `EHR_VOCAB_DIR` environment variable
/// 3. `vocab/` under the dataset root
pub fn resolve_vocab_dir(explicit: Option<&Path>, dataset_root: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(root) = std::env::var(VOCAB_ENV_VAR)
        && !root.trim().is_empty()
    {
        return PathBuf::from(root);
    }
    dataset_root.join("vocab")
}
