//! Behavioural tests for the marker store

use std::cell::Cell;
use std::rc::Rc;

use geomark_applications::{DraftField, MarkerStore, MemoryKeyValueStore};
use geomark_core::{
    Category, CategoryFilter, ErrorContext, GeomarkError, GeomarkResult, KeyValueStore, Marker,
    Position, MARKERS_KEY,
};

/// Memory store whose writes can be switched off
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryKeyValueStore,
    failing: Rc<Cell<bool>>,
}

impl FlakyStore {
    fn fail_writes(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> GeomarkResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> GeomarkResult<()> {
        if self.failing.get() {
            return Err(GeomarkError::Internal {
                message: "quota exceeded".to_string(),
                source: None,
                context: ErrorContext::new("flaky_store"),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> GeomarkResult<()> {
        self.inner.remove(key)
    }
}

fn add<P: geomark_core::MarkerPersistence>(
    store: &mut MarkerStore<P>,
    description: &str,
    category: Category,
) -> usize {
    store.begin_create(Position::new(51.1694, 71.4491)).unwrap();
    store
        .update_draft(DraftField::Description(description.to_string()))
        .unwrap();
    store
        .update_draft(DraftField::Category(Some(category)))
        .unwrap();
    store.commit().unwrap().index
}

fn persisted(backing: &impl KeyValueStore) -> Vec<Marker> {
    let blob = backing.get(MARKERS_KEY).unwrap().unwrap_or_else(|| "[]".to_string());
    serde_json::from_str(&blob).unwrap()
}

#[test]
fn test_persisted_length_tracks_creates_minus_deletes() {
    let backing = MemoryKeyValueStore::new();
    let mut store = MarkerStore::initialize(backing.clone());

    for i in 0..5 {
        add(&mut store, &format!("marker {}", i), Category::Others);
    }
    store.delete(1).unwrap();
    store.delete(3).unwrap();
    add(&mut store, "late", Category::Nature);

    assert_eq!(store.len(), 4);
    assert_eq!(persisted(&backing).len(), 4);
}

#[test]
fn test_reload_round_trip() {
    let backing = MemoryKeyValueStore::new();
    let mut store = MarkerStore::initialize(backing.clone());

    add(&mut store, "Baiterek", Category::Sight);
    add(&mut store, "Cafe", Category::Restaurant);
    store.begin_create(Position::new(-33.8568, 151.2153)).unwrap();
    store
        .update_draft(DraftField::Description("Harbour".to_string()))
        .unwrap();
    store
        .update_draft(DraftField::Category(Some(Category::Nature)))
        .unwrap();
    store
        .update_draft(DraftField::Image(Some("data:image/png;base64,AAAA".to_string())))
        .unwrap();
    store.commit().unwrap();

    let reloaded = MarkerStore::initialize(backing);
    assert_eq!(reloaded.markers(), store.markers());
}

#[test]
fn test_filter_all_empty_is_identity() {
    let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
    assert_eq!(store.filter(CategoryFilter::All, "").count(), 0);

    add(&mut store, "one", Category::Sight);
    add(&mut store, "two", Category::Nature);
    add(&mut store, "three", Category::Others);

    let view: Vec<_> = store.filter(CategoryFilter::All, "").collect();
    assert_eq!(view.len(), 3);
    for (expected, item) in view.iter().enumerate() {
        assert_eq!(item.index, expected);
        assert_eq!(item.marker, &store.markers()[expected]);
    }
}

#[test]
fn test_edit_preserves_created_at_and_index() {
    let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
    add(&mut store, "first", Category::Sight);
    add(&mut store, "second", Category::Sight);

    let before = store.get(1).unwrap().clone();
    store.begin_edit(1).unwrap();
    store
        .update_draft(DraftField::Category(Some(Category::Nature)))
        .unwrap();
    let outcome = store.commit().unwrap();

    assert_eq!(outcome.index, 1);
    assert!(!outcome.created);

    let after = store.get(1).unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.description, before.description);
    assert_eq!(after.position, before.position);
    assert_eq!(after.category, Category::Nature);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_repeated_delete_at_same_index() {
    let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
    add(&mut store, "a", Category::Others);
    add(&mut store, "b", Category::Others);
    add(&mut store, "c", Category::Others);

    assert_eq!(store.delete(1).unwrap().description, "b");
    assert_eq!(store.delete(1).unwrap().description, "c");
    assert!(matches!(
        store.delete(1),
        Err(GeomarkError::IndexOutOfRange { index: 1, len: 1, .. })
    ));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_empty_description_is_rejected() {
    let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
    store.begin_create(Position::new(51.1694, 71.4491)).unwrap();
    store
        .update_draft(DraftField::Description(String::new()))
        .unwrap();
    store
        .update_draft(DraftField::Category(Some(Category::Sight)))
        .unwrap();

    assert!(matches!(store.commit(), Err(GeomarkError::Validation { .. })));
    assert!(store.is_empty());
}

#[test]
fn test_search_reports_underlying_indices() {
    let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
    add(&mut store, "Cafe Alpha", Category::Restaurant);
    add(&mut store, "Beta Bridge", Category::Sight);

    let hits: Vec<_> = store.filter(CategoryFilter::All, "alpha").collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, 0);
    assert_eq!(hits[0].marker.description, "Cafe Alpha");

    // single letters are plain substrings: "Beta" contains an "a" too
    assert_eq!(store.filter(CategoryFilter::All, "a").count(), 2);

    let bridges: Vec<_> = store.filter(CategoryFilter::All, "BRIDGE").collect();
    assert_eq!(bridges.len(), 1);
    assert_eq!(bridges[0].index, 1);
}

#[test]
fn test_filtered_index_drives_edit() {
    let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
    add(&mut store, "Lake", Category::Nature);
    add(&mut store, "Diner", Category::Restaurant);
    add(&mut store, "Forest", Category::Nature);

    let forest = store
        .filter(CategoryFilter::Only(Category::Nature), "forest")
        .next()
        .unwrap()
        .index;
    assert_eq!(forest, 2);

    store.begin_edit(forest).unwrap();
    store
        .update_draft(DraftField::Description("Old forest".to_string()))
        .unwrap();
    store.commit().unwrap();

    assert_eq!(store.get(2).unwrap().description, "Old forest");
    assert_eq!(store.get(0).unwrap().description, "Lake");
}

#[test]
fn test_failed_write_leaves_state_unchanged() {
    let backing = FlakyStore::default();
    let mut store = MarkerStore::initialize(backing.clone());
    add(&mut store, "kept", Category::Sight);
    let snapshot = store.markers().to_vec();

    backing.fail_writes(true);

    store.begin_create(Position::new(1.0, 1.0)).unwrap();
    store
        .update_draft(DraftField::Description("lost".to_string()))
        .unwrap();
    store
        .update_draft(DraftField::Category(Some(Category::Others)))
        .unwrap();
    assert!(matches!(store.commit(), Err(GeomarkError::Persistence { .. })));
    assert_eq!(store.markers(), snapshot.as_slice());
    assert!(store.draft().is_some(), "draft survives for a retry");

    store.cancel_draft();
    store.begin_edit(0).unwrap();
    store
        .update_draft(DraftField::Description("changed".to_string()))
        .unwrap();
    assert!(store.commit().is_err());
    assert_eq!(store.markers(), snapshot.as_slice());

    assert!(store.delete(0).is_err());
    assert_eq!(store.markers(), snapshot.as_slice());

    backing.fail_writes(false);
    store.commit().unwrap();
    assert_eq!(store.get(0).unwrap().description, "changed");
    assert_eq!(persisted(&backing)[0].description, "changed");
}

#[test]
fn test_missing_blob_starts_empty() {
    let store = MarkerStore::initialize(MemoryKeyValueStore::new());
    assert!(store.is_empty());
    assert!(store.draft().is_none());
}
