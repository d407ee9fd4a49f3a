//! In-memory key-value storage

use geomark_core::{GeomarkResult, KeyValueStore};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Process-local store. Clones share the same map, so a session manager and
/// a marker store built from clones see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> GeomarkResult<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> GeomarkResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        debug!(key = key, bytes = value.len(), "Stored value in memory");
        Ok(())
    }

    fn remove(&self, key: &str) -> GeomarkResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let store = MemoryKeyValueStore::new();
        let other = store.clone();

        store.set("markers", "[]").unwrap();
        assert_eq!(other.get("markers").unwrap().as_deref(), Some("[]"));

        other.remove("markers").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let store = MemoryKeyValueStore::new();
        assert!(store.remove("username").is_ok());
        assert!(store.get("username").unwrap().is_none());
    }
}
