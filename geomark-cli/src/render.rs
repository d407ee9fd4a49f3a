//! Text rendering for the shell

use geomark_applications::{describe_data_url, Draft, DraftOrigin, FilteredMarker};
use geomark_core::{CategoryFilter, GeomarkError, Marker};
use std::fmt::Write;

/// One line per marker in a filtered view, keyed by its index in the full list
pub fn marker_list<'a>(
    view: impl Iterator<Item = FilteredMarker<'a>>,
    total: usize,
    category: CategoryFilter,
    search: &str,
) -> String {
    let mut out = String::new();
    let mut shown = 0;

    for item in view {
        shown += 1;
        let _ = writeln!(out, "  {}", marker_line(item.index, item.marker));
    }

    let scope = if search.is_empty() {
        format!("category {}", category)
    } else {
        format!("category {}, search \"{}\"", category, search)
    };

    if shown == 0 {
        let _ = writeln!(out, "  (no markers match)");
    }
    let _ = write!(out, "📋 {} of {} markers ({})", shown, total, scope);
    out
}

pub fn marker_line(index: usize, marker: &Marker) -> String {
    format!(
        "[{}] {:<10} {}  ({}){}",
        index,
        marker.category,
        marker.description,
        marker.position,
        if marker.has_image() { "  🖼" } else { "" }
    )
}

pub fn marker_details(index: usize, marker: &Marker) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📍 [{}] {}", index, marker.description);
    let _ = writeln!(out, "   category: {}", marker.category);
    let _ = writeln!(out, "   position: {}", marker.position);
    let _ = writeln!(out, "   created:  {}", marker.created_at);
    let _ = write!(out, "   id:       {}", marker.id.short());
    if let Some(image) = &marker.image {
        let summary = describe_data_url(image).unwrap_or_else(|_| "unreadable".to_string());
        let _ = write!(out, "\n   image:    {}", summary);
    }
    out
}

pub fn draft_summary(draft: &Draft) -> String {
    let heading = match draft.origin() {
        DraftOrigin::New => "📝 New marker".to_string(),
        DraftOrigin::Existing(id) => format!("📝 Editing marker {}", id.short()),
    };
    let description = if draft.description().is_empty() {
        "(none)"
    } else {
        draft.description()
    };
    let category = draft
        .category()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "(none)".to_string());
    let image = match draft.image() {
        Some(url) => describe_data_url(url).unwrap_or_else(|_| "unreadable".to_string()),
        None => "(none)".to_string(),
    };

    format!(
        "{} at {}\n   description: {}\n   category:    {}\n   image:       {}\n   'save' to keep it, 'cancel' to discard",
        heading,
        draft.position(),
        description,
        category,
        image
    )
}

/// Error notification with any recovery hints
pub fn error(error: &GeomarkError) -> String {
    let mut out = format!("❌ {}", error);
    for suggestion in error.suggestions() {
        let _ = write!(out, "\n   💡 {}", suggestion);
    }
    out
}

pub const HELP: &str = "\
🔧 Available commands:
  register <username> <password>   Store credentials (replaces any existing user)
  login <username> <password>      Start a session
  logout                           End the session, keep credentials
  whoami                           Show the current session
  new <lat> <lng> | new --here     Start a new marker draft
  edit <index>                     Start editing a marker
  set description <text...>        Set the draft description
  set category <category>          Sight, Restaurant, Nature or Others
  set image <path>                 Attach an image file to the draft
  clear-image                      Remove the draft image
  save                             Save the draft
  cancel                           Discard the draft
  delete <index>                   Delete a marker
  filter <category|All>            Filter the list by category
  search [text]                    Filter by description (empty clears)
  list                             Show the filtered list
  show <index>                     Show one marker and center the map on it
  locate                           Find your current position
  help                             Show this help message
  quit                             Leave the shell";

#[cfg(test)]
mod tests {
    use super::*;
    use geomark_applications::{DraftField, MarkerStore, MemoryKeyValueStore};
    use geomark_core::{Category, ErrorContext, Position};

    fn sample() -> Marker {
        Marker::new(
            Position::new(51.1694, 71.4491),
            "Baiterek",
            Category::Sight,
            Some("data:image/png;base64,AAAA".to_string()),
        )
    }

    #[test]
    fn test_marker_line() {
        let line = marker_line(3, &sample());
        assert!(line.starts_with("[3] Sight"));
        assert!(line.contains("Baiterek"));
        assert!(line.contains("51.16940, 71.44910"));
        assert!(line.ends_with("🖼"));
    }

    #[test]
    fn test_marker_details_describes_image() {
        let details = marker_details(0, &sample());
        assert!(details.contains("image:    image/png, 3 bytes"));
    }

    #[test]
    fn test_empty_list() {
        let out = marker_list(std::iter::empty(), 4, CategoryFilter::All, "zzz");
        assert!(out.contains("(no markers match)"));
        assert!(out.contains("0 of 4 markers"));
        assert!(out.contains("search \"zzz\""));
    }

    #[test]
    fn test_list_keeps_true_indices() {
        let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
        for (description, category) in [("Lake", Category::Nature), ("Diner", Category::Restaurant)] {
            store.begin_create(Position::new(1.0, 1.0)).unwrap();
            store
                .update_draft(DraftField::Description(description.to_string()))
                .unwrap();
            store
                .update_draft(DraftField::Category(Some(category)))
                .unwrap();
            store.commit().unwrap();
        }

        let filter = CategoryFilter::Only(Category::Restaurant);
        let out = marker_list(store.filter(filter, ""), store.len(), filter, "");
        assert!(out.contains("[1] Restaurant"));
        assert!(!out.contains("Lake"));
        assert!(out.contains("1 of 2 markers (category Restaurant)"));
    }

    #[test]
    fn test_draft_summary_shows_unset_fields() {
        let mut store = MarkerStore::initialize(MemoryKeyValueStore::new());
        let draft = store.begin_create(Position::new(1.0, 2.0)).unwrap();
        let out = draft_summary(draft);
        assert!(out.starts_with("📝 New marker at 1.00000, 2.00000"));
        assert!(out.contains("description: (none)"));
        assert!(out.contains("category:    (none)"));
    }

    #[test]
    fn test_error_includes_suggestions() {
        let err = GeomarkError::Authentication {
            message: "log in first".to_string(),
            context: ErrorContext::new("test").with_suggestion("Run 'login'"),
        };
        let out = error(&err);
        assert!(out.starts_with("❌ "));
        assert!(out.contains("💡 Run 'login'"));
    }
}
