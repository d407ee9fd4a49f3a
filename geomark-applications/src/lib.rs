//! Geomark Applications - session and marker workspaces
//!
//! The state objects a front end drives:
//!
//! - [`SessionManager`]: registration, login and logout against a single
//!   stored credential record
//! - [`MarkerStore`]: the persisted marker list, its pending draft and
//!   filtered views
//! - Storage backends behind the core `KeyValueStore` port
//! - Image attachment encoding and one-shot location lookup
//!
//! Both state objects persist synchronously through their port before an
//! operation returns.

pub mod auth;
pub mod image;
pub mod location;
pub mod markers;
pub mod storage;

pub use auth::{hash_password, verify_password, SessionManager};
pub use image::{describe_data_url, encode_image_file};
pub use location::{
    locate, provider_from_config, FixedLocationProvider, UnavailableLocationProvider,
};
pub use markers::{
    CommitOutcome, Draft, DraftField, DraftOrigin, FilteredMarker, MarkerFilter, MarkerStore,
};
pub use storage::{FileKeyValueStore, MemoryKeyValueStore, Storage};
