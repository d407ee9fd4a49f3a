//! Geomark Core - data model, errors, configuration and ports
//!
//! Everything the session and marker workspaces share: the marker data
//! model, the unified error type, TOML configuration, logging setup and the
//! storage/location traits.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use async_utils::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
