//! File-backed key-value storage
//!
//! One file per key under a root directory. Writes land in a sibling temp
//! file first and are renamed into place, so a crash mid-write leaves the
//! previous value intact.

use geomark_core::{persistence_error, GeomarkResult, KeyValueStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> GeomarkResult<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| {
                persistence_error!(
                    format!("Failed to create data directory {}", root.display()),
                    "file_store",
                    e
                )
            })?;
            info!("Created data directory: {}", root.display());
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> GeomarkResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(persistence_error!(
                format!("Invalid storage key '{}'", key),
                "file_store"
            ));
        }
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> GeomarkResult<Option<String>> {
        let path = self.path_for(key)?;

        match std::fs::read_to_string(&path) {
            Ok(value) => {
                debug!(key = key, bytes = value.len(), "Read value from disk");
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(persistence_error!(
                format!("Failed to read {}", path.display()),
                "file_store",
                e
            )),
        }
    }

    fn set(&self, key: &str, value: &str) -> GeomarkResult<()> {
        let path = self.path_for(key)?;
        let tmp_path = self.root.join(format!(".{}.tmp", key));

        std::fs::write(&tmp_path, value).map_err(|e| {
            persistence_error!(
                format!("Failed to write {}", tmp_path.display()),
                "file_store",
                e
            )
        })?;

        std::fs::rename(&tmp_path, &path).map_err(|e| {
            persistence_error!(
                format!("Failed to replace {}", path.display()),
                "file_store",
                e
            )
        })?;

        debug!(key = key, bytes = value.len(), "Wrote value to disk");
        Ok(())
    }

    fn remove(&self, key: &str) -> GeomarkResult<()> {
        let path = self.path_for(key)?;

        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = key, "Removed value from disk");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(persistence_error!(
                format!("Failed to remove {}", path.display()),
                "file_store",
                e
            )),
        }
    }
}
