//! Core trait definitions
//!
//! Ports between the state objects and the outside world. Storage is
//! synchronous and write-through; location is the single async boundary.

use crate::error::GeomarkResult;
use crate::types::*;
use async_trait::async_trait;
use tracing::{error, warn};

/// Fixed key holding the registered username
pub const USERNAME_KEY: &str = "username";
/// Fixed key holding the password hash
pub const PASSWORD_KEY: &str = "password";
/// Fixed key holding the serialized marker sequence
pub const MARKERS_KEY: &str = "markers";

/// String key-value persistence, the analogue of browser local storage
pub trait KeyValueStore {
    /// Read a value; `Ok(None)` when the key was never written
    fn get(&self, key: &str) -> GeomarkResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> GeomarkResult<()>;

    /// Remove a value; removing a missing key is not an error
    fn remove(&self, key: &str) -> GeomarkResult<()>;
}

/// Storage of the single credential record
pub trait CredentialStore {
    fn load_credentials(&self) -> GeomarkResult<Option<CredentialRecord>>;

    /// Overwrite the stored record
    fn save_credentials(&self, record: &CredentialRecord) -> GeomarkResult<()>;

    fn clear_credentials(&self) -> GeomarkResult<()>;
}

/// Storage of the full marker sequence
pub trait MarkerPersistence {
    /// Raw persisted blob, if any. Decoding is left to the marker store so a
    /// corrupt blob can be handled softly.
    fn load_markers(&self) -> GeomarkResult<Option<String>>;

    /// Replace the persisted sequence
    fn save_markers(&self, markers: &[Marker]) -> GeomarkResult<()>;
}

/// One-shot position source
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Resolve the current position once, or report why it is unavailable
    async fn current_position(&self) -> GeomarkResult<Position>;
}

impl<S: KeyValueStore + ?Sized> CredentialStore for S {
    fn load_credentials(&self) -> GeomarkResult<Option<CredentialRecord>> {
        let username = self.get(USERNAME_KEY)?;
        let hashed_password = self.get(PASSWORD_KEY)?;

        Ok(match (username, hashed_password) {
            (Some(username), Some(hashed_password)) => Some(CredentialRecord {
                username,
                hashed_password,
            }),
            _ => None,
        })
    }

    /// Writes both keys; if the hash cannot be written the previous pair is
    /// put back so a username never ends up paired with another user's hash.
    fn save_credentials(&self, record: &CredentialRecord) -> GeomarkResult<()> {
        // an unreadable previous value is treated as absent and removed on rollback
        let read_previous = |key: &str| {
            self.get(key).unwrap_or_else(|e| {
                warn!(key = key, error = %e, "Cannot read previous credential key");
                None
            })
        };
        let previous_username = read_previous(USERNAME_KEY);
        let previous_hash = read_previous(PASSWORD_KEY);

        self.set(USERNAME_KEY, &record.username)?;
        if let Err(e) = self.set(PASSWORD_KEY, &record.hashed_password) {
            for (key, previous) in [
                (USERNAME_KEY, previous_username),
                (PASSWORD_KEY, previous_hash),
            ] {
                let restored = match previous {
                    Some(value) => self.set(key, &value),
                    None => self.remove(key),
                };
                if let Err(restore_error) = restored {
                    error!(key = key, error = %restore_error, "Failed to restore credential key");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    fn clear_credentials(&self) -> GeomarkResult<()> {
        self.remove(USERNAME_KEY)?;
        self.remove(PASSWORD_KEY)
    }
}

impl<S: KeyValueStore + ?Sized> MarkerPersistence for S {
    fn load_markers(&self) -> GeomarkResult<Option<String>> {
        self.get(MARKERS_KEY)
    }

    fn save_markers(&self, markers: &[Marker]) -> GeomarkResult<()> {
        let blob = serde_json::to_string(markers)?;
        self.set(MARKERS_KEY, &blob)
    }
}
