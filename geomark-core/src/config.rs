//! Configuration management

use crate::error::{ErrorContext, GeomarkError, GeomarkResult};
use crate::types::{
    GeomarkConfig, LocationConfig, MapConfig, MarkerConfig, Position, StorageBackend,
    StorageConfig,
};
use std::path::{Path, PathBuf};
use tracing::info;

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.geomark/data".to_string(),
            backend: StorageBackend::File,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // Astana
            default_center: Position::new(51.1694, 71.4491),
            default_zoom: 13,
            fly_to_zoom: 15,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            fixed_position: None,
            timeout_ms: 10_000,
        }
    }
}

impl Default for GeomarkConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            map: MapConfig::default(),
            markers: MarkerConfig::default(),
            location: LocationConfig::default(),
            logging: crate::logging::LoggingConfig::default(),
        }
    }
}

impl GeomarkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GeomarkResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GeomarkError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: GeomarkConfig = toml::from_str(&content).map_err(|e| GeomarkError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GeomarkResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| GeomarkError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| GeomarkError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> GeomarkResult<()> {
        if self.storage.backend == StorageBackend::File && self.storage.data_dir.trim().is_empty() {
            return Err(invalid(
                "storage.data_dir must not be empty for the file backend",
                "Set storage.data_dir or switch storage.backend to \"memory\"",
            ));
        }

        if !self.map.default_center.is_valid() {
            return Err(invalid(
                "map.default_center is outside valid coordinates",
                "Use a latitude within -90..90 and a longitude within -180..180",
            ));
        }

        if self.map.default_zoom > 20 || self.map.fly_to_zoom > 20 {
            return Err(invalid(
                "map zoom levels must be between 0 and 20",
                "Lower map.default_zoom or map.fly_to_zoom",
            ));
        }

        if self.markers.max_image_bytes == 0 {
            return Err(invalid(
                "markers.max_image_bytes must be greater than 0",
                "Set markers.max_image_bytes to a positive value",
            ));
        }

        if let Some(position) = &self.location.fixed_position {
            if !position.is_valid() {
                return Err(invalid(
                    "location.fixed_position is outside valid coordinates",
                    "Fix or remove location.fixed_position",
                ));
            }
        }

        if self.location.timeout_ms == 0 {
            return Err(invalid(
                "location.timeout_ms must be greater than 0",
                "Set location.timeout_ms to a positive value",
            ));
        }

        Ok(())
    }

    /// Data directory with a leading `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.storage.data_dir)
    }

    /// Candidate config locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|d| d.join("geomark").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".geomark").join("config.toml")),
            Some(PathBuf::from("geomark.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from an explicit path, else the first existing default path, else defaults
    pub fn load_or_default(path: Option<&Path>) -> GeomarkResult<Self> {
        if let Some(path) = path {
            info!("Loading configuration from {:?}", path);
            return Self::from_file(path);
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                info!("Loading configuration from {:?}", candidate);
                return Self::from_file(candidate);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::default())
    }
}

fn invalid(message: &str, suggestion: &str) -> GeomarkError {
    GeomarkError::Config {
        message: message.to_string(),
        source: None,
        context: ErrorContext::new("config")
            .with_operation("validate")
            .with_suggestion(suggestion),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GeomarkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.map.default_zoom, 13);
        assert_eq!(config.map.fly_to_zoom, 15);
    }

    #[test]
    fn test_expand_home_leaves_plain_paths_alone() {
        assert_eq!(expand_home("/tmp/geomark"), PathBuf::from("/tmp/geomark"));
        assert_eq!(expand_home("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_expand_home_resolves_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.geomark/data"), home.join(".geomark/data"));
        }
    }

    #[test]
    fn test_validate_rejects_bad_center() {
        let mut config = GeomarkConfig::default();
        config.map.default_center = Position::new(120.0, 0.0);
        assert!(matches!(config.validate(), Err(GeomarkError::Config { .. })));
    }

    #[test]
    fn test_memory_backend_allows_empty_data_dir() {
        let mut config = GeomarkConfig::default();
        config.storage.data_dir = String::new();
        assert!(config.validate().is_err());

        config.storage.backend = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }
}
