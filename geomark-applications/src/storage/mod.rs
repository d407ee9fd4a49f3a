//! Key-value storage backends
//!
//! The session manager and the marker store only see the `KeyValueStore`
//! trait; which backend sits behind it is decided by configuration.

pub mod file;
pub mod memory;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

use geomark_core::{GeomarkConfig, GeomarkResult, KeyValueStore, StorageBackend};
use tracing::info;

/// Storage backend selected at startup
#[derive(Debug, Clone)]
pub enum Storage {
    /// Files under the configured data directory
    File(FileKeyValueStore),
    /// Process memory (for tests and throwaway runs)
    Memory(MemoryKeyValueStore),
}

impl Storage {
    /// Open the backend named in the configuration
    pub fn open(config: &GeomarkConfig) -> GeomarkResult<Self> {
        match config.storage.backend {
            StorageBackend::File => {
                let data_dir = config.data_dir();
                info!("Using file storage at {}", data_dir.display());
                Ok(Self::File(FileKeyValueStore::new(data_dir)?))
            }
            StorageBackend::Memory => {
                info!("Using in-memory storage; nothing will be saved");
                Ok(Self::Memory(MemoryKeyValueStore::new()))
            }
        }
    }

    pub fn memory() -> Self {
        Self::Memory(MemoryKeyValueStore::new())
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(store) => format!("file storage at {}", store.root().display()),
            Self::Memory(_) => "in-memory storage".to_string(),
        }
    }
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> GeomarkResult<Option<String>> {
        match self {
            Self::File(store) => store.get(key),
            Self::Memory(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> GeomarkResult<()> {
        match self {
            Self::File(store) => store.set(key, value),
            Self::Memory(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> GeomarkResult<()> {
        match self {
            Self::File(store) => store.remove(key),
            Self::Memory(store) => store.remove(key),
        }
    }
}
