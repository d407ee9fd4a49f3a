//! Marker workspace
//!
//! Owns the marker list, the single pending draft and the filtered views
//! over the list.

pub mod draft;
pub mod filter;
pub mod store;

pub use draft::{Draft, DraftField, DraftOrigin};
pub use filter::{matches, FilteredMarker, MarkerFilter};
pub use store::{CommitOutcome, MarkerStore};
