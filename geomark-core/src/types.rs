//! Core data type definitions

use crate::error::{ErrorContext, GeomarkError, GeomarkResult};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point on the map, persisted as `[lat, lng]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PositionRepr", into = "[f64; 2]")]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Accepted on-disk shapes. Older blobs stored the map widget's `{lat, lng}` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Pair([f64; 2]),
    LatLng { lat: f64, lng: f64 },
}

impl From<PositionRepr> for Position {
    fn from(repr: PositionRepr) -> Self {
        match repr {
            PositionRepr::Pair([lat, lng]) => Position { lat, lng },
            PositionRepr::LatLng { lat, lng } => Position { lat, lng },
        }
    }
}

impl From<Position> for [f64; 2] {
    fn from(position: Position) -> Self {
        [position.lat, position.lng]
    }
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and inside WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn validate(&self) -> GeomarkResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(GeomarkError::Validation {
                message: format!("Position {} is outside valid coordinates", self),
                field: Some("position".to_string()),
                context: ErrorContext::new("types")
                    .with_operation("validate_position")
                    .with_suggestion("Latitude must be within -90..90 and longitude within -180..180"),
            })
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

impl FromStr for Position {
    type Err = GeomarkError;

    /// Parses `"lat,lng"` (whitespace around either number is ignored)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GeomarkError::Validation {
            message: format!("Cannot parse position from '{}'", s),
            field: Some("position".to_string()),
            context: ErrorContext::new("types")
                .with_operation("parse_position")
                .with_suggestion("Use the form 'lat,lng', e.g. '51.1694,71.4491'"),
        };

        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;

        let position = Position::new(lat, lng);
        position.validate()?;
        Ok(position)
    }
}

/// Marker category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Sight,
    Restaurant,
    Nature,
    Others,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Sight,
        Category::Restaurant,
        Category::Nature,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sight => "Sight",
            Category::Restaurant => "Restaurant",
            Category::Nature => "Nature",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GeomarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GeomarkError::Validation {
                message: format!("Unknown category '{}'", s),
                field: Some("category".to_string()),
                context: ErrorContext::new("types")
                    .with_operation("parse_category")
                    .with_suggestion("Use one of: Sight, Restaurant, Nature, Others"),
            })
    }
}

/// Category selector used by filtered views; `All` is never stored on a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        CategoryFilter::Only(category)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(category) => category.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = GeomarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            s.parse::<Category>().map(CategoryFilter::Only)
        }
    }
}

/// Stable marker identifier, assigned once at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(uuid::Uuid);

impl MarkerId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// First eight hex digits, enough to tell markers apart on screen
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MarkerId {
    type Err = GeomarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim())
            .map(MarkerId)
            .map_err(|e| GeomarkError::Validation {
                message: format!("Invalid marker id '{}': {}", s, e),
                field: Some("id".to_string()),
                context: ErrorContext::new("types").with_operation("parse_marker_id"),
            })
    }
}

/// A persisted point annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Missing in blobs written before ids existed; generated on load
    #[serde(default)]
    pub id: MarkerId,
    pub position: Position,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub image: Option<String>,
    /// Captured at creation, never rewritten by edits
    pub created_at: String,
}

impl Marker {
    /// Build a new marker stamped with the current local time
    pub fn new(
        position: Position,
        description: impl Into<String>,
        category: Category,
        image: Option<String>,
    ) -> Self {
        Self {
            id: MarkerId::new(),
            position,
            description: description.into(),
            category,
            image,
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }

    /// Check the invariants every persisted marker must hold
    pub fn validate(&self) -> GeomarkResult<()> {
        if self.description.trim().is_empty() {
            return Err(GeomarkError::Validation {
                message: "Description must not be empty".to_string(),
                field: Some("description".to_string()),
                context: ErrorContext::new("types").with_operation("validate_marker"),
            });
        }
        self.position.validate()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// The logged-in identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            started_at: chrono::Utc::now(),
        }
    }
}

/// The single stored username / password-hash pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    /// PHC-format hash string
    pub hashed_password: String,
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeomarkConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON document per key; `~` expands to the home dir
    pub data_dir: String,
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files under `data_dir`
    File,
    /// Process memory only; nothing survives exit
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial map center
    pub default_center: Position,
    pub default_zoom: u8,
    /// Zoom used when flying to a marker or the user's location
    pub fly_to_zoom: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Largest image file accepted as an inline attachment
    pub max_image_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Position reported by the fixed location provider; unset means unavailable
    pub fixed_position: Option<Position>,
    pub timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_position() {
        let position: Position = " 51.1694 , 71.4491 ".parse().unwrap();
        assert_eq!(position, Position::new(51.1694, 71.4491));

        assert!("51.1694".parse::<Position>().is_err());
        assert!("north,east".parse::<Position>().is_err());
        assert!("91,0".parse::<Position>().is_err());
        assert!("0,-181".parse::<Position>().is_err());
    }

    #[test]
    fn test_non_finite_position_is_invalid() {
        assert!(!Position::new(f64::NAN, 0.0).is_valid());
        assert!(!Position::new(0.0, f64::INFINITY).is_valid());
        assert!(Position::new(-90.0, 180.0).is_valid());
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("restaurant".parse::<Category>().unwrap(), Category::Restaurant);
        assert_eq!("SIGHT".parse::<Category>().unwrap(), Category::Sight);
        assert!("Museum".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_filter_matches() {
        assert!(CategoryFilter::All.matches(Category::Nature));
        assert!(CategoryFilter::Only(Category::Nature).matches(Category::Nature));
        assert!(!CategoryFilter::Only(Category::Nature).matches(Category::Sight));
    }

    #[test]
    fn test_blank_description_fails_validation() {
        let marker = Marker::new(Position::new(0.0, 0.0), "   ", Category::Others, None);
        assert!(matches!(
            marker.validate(),
            Err(GeomarkError::Validation { field: Some(ref f), .. }) if f == "description"
        ));
    }

    #[test]
    fn test_marker_id_round_trips_through_text() {
        let id = MarkerId::new();
        assert_eq!(id.to_string().parse::<MarkerId>().unwrap(), id);
        assert_eq!(id.short().len(), 8);
        assert!("not-a-uuid".parse::<MarkerId>().is_err());
    }
}
