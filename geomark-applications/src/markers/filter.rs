//! Filtered marker views

use geomark_core::{CategoryFilter, Marker};
use std::iter::Enumerate;
use std::slice;

/// A marker in a filtered view, tagged with its index in the full list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilteredMarker<'a> {
    /// Position in the underlying sequence, usable with edit and delete
    pub index: usize,
    pub marker: &'a Marker,
}

/// Lazy view over markers matching a category and a description substring.
///
/// Clone the view before iterating to walk it again from the start.
#[derive(Debug, Clone)]
pub struct MarkerFilter<'a> {
    inner: Enumerate<slice::Iter<'a, Marker>>,
    category: CategoryFilter,
    needle: String,
}

impl<'a> MarkerFilter<'a> {
    pub fn new(markers: &'a [Marker], category: CategoryFilter, search: &str) -> Self {
        Self {
            inner: markers.iter().enumerate(),
            category,
            needle: search.to_lowercase(),
        }
    }
}

/// Category equality plus case-insensitive substring match on the description
pub fn matches(category: CategoryFilter, search: &str, marker: &Marker) -> bool {
    matches_lowered(category, &search.to_lowercase(), marker)
}

fn matches_lowered(category: CategoryFilter, needle: &str, marker: &Marker) -> bool {
    category.matches(marker.category)
        && (needle.is_empty() || marker.description.to_lowercase().contains(needle))
}

impl<'a> Iterator for MarkerFilter<'a> {
    type Item = FilteredMarker<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, marker) in self.inner.by_ref() {
            if matches_lowered(self.category, &self.needle, marker) {
                return Some(FilteredMarker { index, marker });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
