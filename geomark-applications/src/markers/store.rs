//! Marker store
//!
//! The authoritative ordered list of markers plus at most one pending draft.
//! Every successful mutation writes the whole list through the persistence
//! port before the new state becomes visible; a failed write leaves both the
//! list and the draft exactly as they were.

use super::draft::{Draft, DraftField, DraftOrigin};
use super::filter::MarkerFilter;
use geomark_core::{
    performance, Category, CategoryFilter, ErrorContext, GeomarkError, GeomarkResult, Marker, MarkerId,
    MarkerPersistence, Position,
};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Result of a successful commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    pub id: MarkerId,
    /// Index of the committed marker in the full list
    pub index: usize,
    /// `true` when a new marker was appended, `false` for an edit
    pub created: bool,
}

pub struct MarkerStore<P> {
    persistence: P,
    markers: Vec<Marker>,
    draft: Option<Draft>,
}

impl<P: MarkerPersistence> MarkerStore<P> {
    /// Load persisted markers. Never fails: a missing, unreadable or corrupt
    /// blob yields an empty store.
    pub fn initialize(persistence: P) -> Self {
        let markers = performance::measure_sync("load_markers", || {
            match persistence.load_markers() {
                Ok(Some(blob)) => decode_markers(&blob),
                Ok(None) => {
                    debug!("No persisted markers, starting empty");
                    Vec::new()
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read persisted markers, starting empty");
                    Vec::new()
                }
            }
        });

        info!(count = markers.len(), "Marker store initialized");

        Self {
            persistence,
            markers,
            draft: None,
        }
    }

    /// Open a draft for a new marker at `position`, replacing any pending draft
    pub fn begin_create(&mut self, position: Position) -> GeomarkResult<&Draft> {
        position.validate()?;
        self.replace_draft(Draft::new(position))
    }

    /// Copy the marker at `index` into the draft
    pub fn begin_edit(&mut self, index: usize) -> GeomarkResult<&Draft> {
        let marker = self
            .markers
            .get(index)
            .ok_or_else(|| self.out_of_range(index, "begin_edit"))?;
        let draft = Draft::from_marker(marker);
        self.replace_draft(draft)
    }

    pub fn begin_edit_by_id(&mut self, id: MarkerId) -> GeomarkResult<&Draft> {
        let index = self
            .index_of(id)
            .ok_or_else(|| unknown_marker(id, "begin_edit"))?;
        self.begin_edit(index)
    }

    /// Change one field of the pending draft
    pub fn update_draft(&mut self, field: DraftField) -> GeomarkResult<&Draft> {
        let draft = self.draft.as_mut().ok_or_else(|| no_draft("update_draft"))?;
        draft.apply(field);
        Ok(&*draft)
    }

    /// Drop the pending draft without saving
    pub fn cancel_draft(&mut self) -> Option<Draft> {
        let cancelled = self.draft.take();
        if cancelled.is_some() {
            debug!("Draft cancelled");
        }
        cancelled
    }

    /// Validate the draft and write it into the list.
    ///
    /// New drafts are appended with a fresh id and timestamp. Edit drafts
    /// replace their marker in place and keep its id and `created_at`.
    pub fn commit(&mut self) -> GeomarkResult<CommitOutcome> {
        let draft = self.draft.clone().ok_or_else(|| no_draft("commit"))?;
        let category = draft.validate()?;
        let image = draft.image().map(str::to_string);

        let outcome = match draft.origin() {
            DraftOrigin::New => {
                let marker = Marker::new(draft.position(), draft.description(), category, image);
                let id = marker.id;

                self.markers.push(marker);
                if let Err(e) = self.persist() {
                    self.markers.pop();
                    return Err(e);
                }

                CommitOutcome {
                    id,
                    index: self.markers.len() - 1,
                    created: true,
                }
            }
            DraftOrigin::Existing(id) => {
                let index = self
                    .index_of(id)
                    .ok_or_else(|| unknown_marker(id, "commit"))?;
                let updated = Marker {
                    id,
                    position: draft.position(),
                    description: draft.description().to_string(),
                    category,
                    image,
                    created_at: self.markers[index].created_at.clone(),
                };

                let previous = std::mem::replace(&mut self.markers[index], updated);
                if let Err(e) = self.persist() {
                    self.markers[index] = previous;
                    return Err(e);
                }

                CommitOutcome {
                    id,
                    index,
                    created: false,
                }
            }
        };

        self.draft = None;
        info!(
            id = %outcome.id,
            index = outcome.index,
            created = outcome.created,
            "Marker saved"
        );
        Ok(outcome)
    }

    /// Remove the marker at `index`; later markers shift down by one.
    ///
    /// A pending edit of the removed marker is discarded.
    pub fn delete(&mut self, index: usize) -> GeomarkResult<Marker> {
        if index >= self.markers.len() {
            return Err(self.out_of_range(index, "delete"));
        }

        let removed = self.markers.remove(index);
        if let Err(e) = self.persist() {
            self.markers.insert(index, removed);
            return Err(e);
        }

        if self.draft.as_ref().and_then(Draft::editing) == Some(removed.id) {
            self.draft = None;
            debug!(id = %removed.id, "Discarded draft of deleted marker");
        }

        info!(id = %removed.id, index = index, "Marker deleted");
        Ok(removed)
    }

    pub fn delete_by_id(&mut self, id: MarkerId) -> GeomarkResult<Marker> {
        let index = self.index_of(id).ok_or_else(|| unknown_marker(id, "delete"))?;
        self.delete(index)
    }

    /// Markers matching `category` whose description contains `search`
    /// (case-insensitive; empty matches all), with their true indices
    pub fn filter(&self, category: CategoryFilter, search: &str) -> MarkerFilter<'_> {
        MarkerFilter::new(&self.markers, category, search)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn get_by_id(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn index_of(&self, id: MarkerId) -> Option<usize> {
        self.markers.iter().position(|m| m.id == id)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    fn replace_draft(&mut self, draft: Draft) -> GeomarkResult<&Draft> {
        if self.draft.is_some() {
            debug!("Replacing pending draft");
        }
        Ok(&*self.draft.insert(draft))
    }

    fn persist(&self) -> GeomarkResult<()> {
        self.persistence
            .save_markers(&self.markers)
            .map_err(|e| match e {
                GeomarkError::Persistence { .. } => e,
                other => GeomarkError::Persistence {
                    message: format!("Failed to save markers: {}", other),
                    source: Some(Box::new(other)),
                    context: ErrorContext::new("marker_store").with_operation("persist"),
                },
            })
    }

    fn out_of_range(&self, index: usize, operation: &str) -> GeomarkError {
        GeomarkError::IndexOutOfRange {
            index,
            len: self.markers.len(),
            context: ErrorContext::new("marker_store")
                .with_operation(operation)
                .with_suggestion("Run 'list' to see current marker numbers"),
        }
    }
}

fn unknown_marker(id: MarkerId, operation: &str) -> GeomarkError {
    GeomarkError::NotFound {
        resource: format!("marker {}", id),
        context: ErrorContext::new("marker_store").with_operation(operation),
    }
}

fn no_draft(operation: &str) -> GeomarkError {
    GeomarkError::NotFound {
        resource: "pending draft".to_string(),
        context: ErrorContext::new("marker_store")
            .with_operation(operation)
            .with_suggestion("Start one with 'new <lat> <lng>' or 'edit <index>'"),
    }
}

/// Decode a persisted blob, dropping records that are unreadable or break
/// marker invariants. A blob that is not a JSON array decodes to nothing.
fn decode_markers(blob: &str) -> Vec<Marker> {
    let records: Vec<serde_json::Value> = match serde_json::from_str(blob) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Persisted markers are corrupt, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::with_capacity(records.len());
    let mut markers = Vec::with_capacity(records.len());

    for (record_index, mut record) in records.into_iter().enumerate() {
        promote_filter_category(record_index, &mut record);

        let mut marker: Marker = match serde_json::from_value(record) {
            Ok(marker) => marker,
            Err(e) => {
                warn!(record = record_index, error = %e, "Skipping unreadable marker");
                continue;
            }
        };

        if let Err(e) = marker.validate() {
            warn!(record = record_index, error = %e, "Skipping invalid marker");
            continue;
        }

        if !seen.insert(marker.id) {
            warn!(record = record_index, id = %marker.id, "Duplicate marker id, assigning a new one");
            marker.id = MarkerId::new();
            seen.insert(marker.id);
        }

        markers.push(marker);
    }

    markers
}

/// Older editors could save the "All" filter value as a marker's category.
/// Such records are kept and filed under `Others`.
fn promote_filter_category(record_index: usize, record: &mut serde_json::Value) {
    let Some(category) = record.get_mut("category") else {
        return;
    };
    if category
        .as_str()
        .is_some_and(|c| c.trim().eq_ignore_ascii_case("all"))
    {
        warn!(
            record = record_index,
            "Marker stored with category All, filing it under Others"
        );
        *category = serde_json::Value::String(Category::Others.as_str().to_string());
    }
}
