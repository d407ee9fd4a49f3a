//! Integration tests for geomark-core infrastructure

use std::cell::RefCell;
use std::collections::HashMap;
use geomark_core::{
    config_error, init_logging, not_found_error, Category, CategoryFilter, CredentialRecord,
    CredentialStore, ErrorContext, GeomarkConfig, GeomarkError, GeomarkResult, KeyValueStore,
    LogFormat, LoggingConfig, Marker, MarkerPersistence, Position, StorageBackend, MARKERS_KEY,
};

#[derive(Default)]
struct MapStore {
    values: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MapStore {
    fn get(&self, key: &str) -> GeomarkResult<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> GeomarkResult<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> GeomarkResult<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

#[test]
fn test_error_handling() {
    let error = not_found_error!("credential record", "test_component");

    match &error {
        GeomarkError::NotFound { resource, context } => {
            assert_eq!(resource, "credential record");
            assert_eq!(context.component, "test_component");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected NotFound error"),
    }
    assert!(error.is_user_error());
    error.log();

    let config_error = config_error!("Invalid config", "test");
    assert!(!config_error.is_user_error());
    assert_eq!(config_error.suggestions().len(), 2);

    let location_error = GeomarkError::Location {
        message: "no fix".to_string(),
        context: ErrorContext::new("test"),
    };
    assert!(!location_error.is_user_error());
}

#[test]
fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        include_location: false,
        include_thread: false,
        log_file_path: None,
        enable_performance_monitoring: false,
        filter_directives: vec!["geomark_core=debug".to_string()],
    };

    // A second initialization in the same process must fail instead of panicking
    let _ = init_logging(&config);
    assert!(init_logging(&config).is_err());
}

#[test]
fn test_config_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = GeomarkConfig::default();
    config.storage.backend = StorageBackend::Memory;
    config.location.fixed_position = Some(Position::new(43.2389, 76.8897));
    config.markers.max_image_bytes = 1024;

    config.save_to_file(&path).unwrap();
    let loaded = GeomarkConfig::from_file(&path).unwrap();

    assert_eq!(loaded.storage.backend, StorageBackend::Memory);
    assert_eq!(
        loaded.location.fixed_position,
        Some(Position::new(43.2389, 76.8897))
    );
    assert_eq!(loaded.markers.max_image_bytes, 1024);
    assert_eq!(loaded.map.default_center, Position::new(51.1694, 71.4491));
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geomark.toml");
    std::fs::write(
        &path,
        "[storage]\ndata_dir = \"/tmp/geomark-test\"\nbackend = \"file\"\n",
    )
    .unwrap();

    let config = GeomarkConfig::from_file(&path).unwrap();
    assert_eq!(config.data_dir(), std::path::PathBuf::from("/tmp/geomark-test"));
    assert_eq!(config.location.timeout_ms, 10_000);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geomark.toml");
    std::fs::write(&path, "[markers]\nmax_image_bytes = 0\n").unwrap();

    assert!(matches!(
        GeomarkConfig::from_file(&path),
        Err(GeomarkError::Config { .. })
    ));

    std::fs::write(&path, "this is = = not toml").unwrap();
    assert!(matches!(
        GeomarkConfig::from_file(&path),
        Err(GeomarkError::Config { .. })
    ));
}

#[test]
fn test_marker_wire_format() {
    let marker = Marker::new(
        Position::new(51.1694, 71.4491),
        "Baiterek",
        Category::Sight,
        None,
    );
    let value = serde_json::to_value(&marker).unwrap();

    assert_eq!(value["position"], serde_json::json!([51.1694, 71.4491]));
    assert_eq!(value["category"], "Sight");
    assert_eq!(value["description"], "Baiterek");
    assert!(value["image"].is_null());
    assert_eq!(value["createdAt"], marker.created_at.as_str());
    assert_eq!(value["id"], marker.id.to_string());
}

#[test]
fn test_legacy_marker_without_id_loads() {
    let blob = r#"{
        "position": {"lat": 51.1, "lng": 71.4},
        "description": "Old cafe",
        "category": "Restaurant",
        "image": null,
        "createdAt": "12.03.2024, 10:15:00"
    }"#;

    let marker: Marker = serde_json::from_str(blob).unwrap();
    assert_eq!(marker.position, Position::new(51.1, 71.4));
    assert_eq!(marker.category, Category::Restaurant);
    assert_eq!(marker.created_at, "12.03.2024, 10:15:00");
    assert!(marker.validate().is_ok());
}

#[test]
fn test_filter_sentinel_is_not_a_category() {
    assert!("All".parse::<Category>().is_err());
    assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    assert_eq!(
        "nature".parse::<CategoryFilter>().unwrap(),
        CategoryFilter::Only(Category::Nature)
    );
}

#[test]
fn test_key_value_store_backs_credentials_and_markers() {
    let store = MapStore::default();
    assert!(store.load_credentials().unwrap().is_none());

    let record = CredentialRecord {
        username: "alice".to_string(),
        hashed_password: "$argon2id$stub".to_string(),
    };
    store.save_credentials(&record).unwrap();
    assert_eq!(store.get("username").unwrap().as_deref(), Some("alice"));
    assert_eq!(store.load_credentials().unwrap(), Some(record));

    store.clear_credentials().unwrap();
    assert!(store.load_credentials().unwrap().is_none());

    assert!(store.load_markers().unwrap().is_none());
    let markers = vec![Marker::new(
        Position::new(1.0, 2.0),
        "Somewhere",
        Category::Others,
        Some("data:image/png;base64,AAAA".to_string()),
    )];
    store.save_markers(&markers).unwrap();

    let blob = store.get(MARKERS_KEY).unwrap().unwrap();
    let decoded: Vec<Marker> = serde_json::from_str(&blob).unwrap();
    assert_eq!(decoded, markers);
}
