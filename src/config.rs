//! Store configuration: where the two byte streams live and whether
//! writes are synced to disk immediately.

use std::path::{Path, PathBuf};

/// Configuration for a `Store`.
///
/// `Config::new` derives the metadata path the way the original source
/// does: same file stem as the values file, with a `_metadata.json`
/// suffix, placed alongside it.
#[derive(Clone, Debug)]
pub struct Config {
    pub values_path: PathBuf,
    pub metadata_path: PathBuf,
    /// Whether every `set`/`remove` calls `fsync` on both streams.
    /// Defaults to `true`. Setting this to `false` trades the
    /// durability this crate already disclaims as a non-goal for
    /// higher write throughput.
    pub sync_on_write: bool,
}

impl Config {
    pub fn new<P: AsRef<Path>>(values_path: P) -> Config {
        let values_path = values_path.as_ref().to_path_buf();
        let metadata_path = Self::derive_metadata_path(&values_path);
        Config {
            values_path,
            metadata_path,
            sync_on_write: true,
        }
    }

    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Config {
        self.sync_on_write = sync_on_write;
        self
    }

    pub fn with_metadata_path<P: AsRef<Path>>(mut self, metadata_path: P) -> Config {
        self.metadata_path = metadata_path.as_ref().to_path_buf();
        self
    }

    fn derive_metadata_path(values_path: &Path) -> PathBuf {
        let stem = values_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "db".to_string());
        let mut metadata_path = values_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        metadata_path.push(format!("{}_metadata.json", stem));
        metadata_path
    }
}
