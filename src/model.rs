use crate::validate::CoordinatePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration assembled from CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub seed_file: Option<PathBuf>,
    pub view: MapView,
    pub tiles: TileLayer,
    pub policy: CoordinatePolicy,
    pub tick_rate: Duration,
}

/// A `(latitude, longitude)` pair, stored on disk as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lon]
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub coordinates: Coordinates,
}

impl Marker {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            coordinates: Coordinates::new(lat, lon),
        }
    }

    /// Non-empty name and finite coordinates.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty() && self.coordinates.is_finite()
    }
}

/// Ordered, never-empty list of markers.
///
/// Values are replaced wholesale rather than mutated: [`MarkerCollection::appended`]
/// returns a new collection with a bumped `revision`, which the map controller
/// compares to decide whether its rendering is stale. The revision is not
/// persisted and does not take part in equality.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct MarkerCollection {
    markers: Vec<Marker>,
    #[serde(skip)]
    revision: u64,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvalidCollection {
    #[error("marker collection is empty")]
    Empty,
    #[error("marker #{index} has an empty name or non-finite coordinates")]
    BadMarker { index: usize },
}

impl MarkerCollection {
    /// Build a collection, checking the per-marker and non-empty invariants.
    pub fn from_markers(markers: Vec<Marker>) -> Result<Self, InvalidCollection> {
        if markers.is_empty() {
            return Err(InvalidCollection::Empty);
        }
        if let Some(index) = markers.iter().position(|m| !m.is_well_formed()) {
            return Err(InvalidCollection::BadMarker { index });
        }
        Ok(Self {
            markers,
            revision: 0,
        })
    }

    /// Built-in collections whose markers are literals known to be well formed.
    pub(crate) fn from_trusted(markers: Vec<Marker>) -> Self {
        debug_assert!(!markers.is_empty() && markers.iter().all(Marker::is_well_formed));
        Self {
            markers,
            revision: 0,
        }
    }

    /// New collection with `marker` at the end. `self` is left untouched.
    ///
    /// A marker with an empty name or non-finite coordinates is refused, so a
    /// persisted snapshot always decodes again.
    pub fn appended(&self, marker: Marker) -> Result<Self, InvalidCollection> {
        if !marker.is_well_formed() {
            return Err(InvalidCollection::BadMarker {
                index: self.markers.len(),
            });
        }
        let mut markers = Vec::with_capacity(self.markers.len() + 1);
        markers.extend_from_slice(&self.markers);
        markers.push(marker);
        Ok(Self {
            markers,
            revision: self.revision + 1,
        })
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn last(&self) -> Option<&Marker> {
        self.markers.last()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl PartialEq for MarkerCollection {
    fn eq(&self, other: &Self) -> bool {
        self.markers == other.markers
    }
}

impl<'a> IntoIterator for &'a MarkerCollection {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.iter()
    }
}

/// Viewpoint of a map widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Coordinates::new(47.2357, 39.7015),
            zoom: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".into(),
            attribution: "Map data © OpenStreetMap contributors".into(),
            max_zoom: 20,
        }
    }
}

/// Icon used for every placed marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerIcon {
    pub glyph: char,
    pub width: u16,
    pub height: u16,
}

impl Default for MarkerIcon {
    fn default() -> Self {
        Self {
            glyph: '📍',
            width: 32,
            height: 40,
        }
    }
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

/// User-visible notification for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}
