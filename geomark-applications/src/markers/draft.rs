//! Pending marker edits

use geomark_core::{validation_error, Category, GeomarkResult, Marker, MarkerId, Position};

/// Where a draft came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOrigin {
    /// A marker that does not exist yet
    New,
    /// A copy of the marker with this id
    Existing(MarkerId),
}

/// A field the user can change on a draft
#[derive(Debug, Clone, PartialEq)]
pub enum DraftField {
    Description(String),
    /// `None` puts the draft back to "no category chosen"
    Category(Option<Category>),
    /// Inline image payload, or `None` to drop the image
    Image(Option<String>),
}

/// A marker under construction. Changes stay here until committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    origin: DraftOrigin,
    position: Position,
    description: String,
    category: Option<Category>,
    image: Option<String>,
}

impl Draft {
    pub(crate) fn new(position: Position) -> Self {
        Self {
            origin: DraftOrigin::New,
            position,
            description: String::new(),
            category: None,
            image: None,
        }
    }

    pub(crate) fn from_marker(marker: &Marker) -> Self {
        Self {
            origin: DraftOrigin::Existing(marker.id),
            position: marker.position,
            description: marker.description.clone(),
            category: Some(marker.category),
            image: marker.image.clone(),
        }
    }

    pub(crate) fn apply(&mut self, field: DraftField) {
        match field {
            DraftField::Description(description) => self.description = description,
            DraftField::Category(category) => self.category = category,
            DraftField::Image(image) => self.image = image,
        }
    }

    /// Check the draft can become a marker; yields the chosen category
    pub(crate) fn validate(&self) -> GeomarkResult<Category> {
        if self.description.trim().is_empty() {
            return Err(validation_error!(
                "Description must not be empty",
                "description",
                "draft"
            ));
        }
        let category = self.category.ok_or_else(|| {
            validation_error!("Choose a category before saving", "category", "draft")
        })?;
        self.position.validate()?;
        Ok(category)
    }

    pub fn origin(&self) -> DraftOrigin {
        self.origin
    }

    /// Id of the marker being edited, `None` for a new marker
    pub fn editing(&self) -> Option<MarkerId> {
        match self.origin {
            DraftOrigin::New => None,
            DraftOrigin::Existing(id) => Some(id),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}
