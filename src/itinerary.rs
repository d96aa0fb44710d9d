//! Itinerary data model shared by the resolver, router and render state.

use serde::{Deserialize, Serialize};

/// Coordinates closer than this (degrees, per axis) are the same location.
const SAME_STOP_EPSILON: f64 = 1e-6;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both components are within `epsilon` degrees of `other`.
    pub fn approx_eq(&self, other: &Coordinate, epsilon: f64) -> bool {
        (self.lat - other.lat).abs() <= epsilon && (self.lng - other.lng).abs() <= epsilon
    }

    /// Whether the point lies inside valid latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// One row of the itinerary table, as supplied by the editor.
///
/// Only `day`, `place_id`, `map_url` and `name` influence routing. The
/// remaining fields are carried for the editor and ignored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRow {
    pub id: String,
    pub day: u32,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub map_url: String,
    #[serde(default)]
    pub place_id: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

fn default_kind() -> String {
    "spot".to_string()
}

impl ItineraryRow {
    pub fn new(id: impl Into<String>, day: u32) -> Self {
        Self {
            id: id.into(),
            day,
            kind: default_kind(),
            name: String::new(),
            map_url: String::new(),
            place_id: String::new(),
            memo: String::new(),
            cost: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_map_url(mut self, url: impl Into<String>) -> Self {
        self.map_url = url.into();
        self
    }

    pub fn with_place_id(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = place_id.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// A row is a routing candidate when any source field is usable.
    pub fn is_candidate(&self) -> bool {
        LookupKey::for_row(self).is_some()
    }
}

/// Which lookup strategy resolves a row, carrying the lookup input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    PlaceId(String),
    MapUrl(String),
    Query(String),
}

impl LookupKey {
    /// Picks the strategy for a row: place id, then map link, then name.
    pub fn for_row(row: &ItineraryRow) -> Option<Self> {
        if !row.place_id.is_empty() {
            return Some(LookupKey::PlaceId(row.place_id.clone()));
        }
        if !row.map_url.is_empty() {
            return Some(LookupKey::MapUrl(row.map_url.clone()));
        }
        let query = row.name.trim();
        if !query.is_empty() {
            return Some(LookupKey::Query(query.to_string()));
        }
        None
    }

    /// The raw lookup input (place id, URL or query text).
    pub fn input(&self) -> &str {
        match self {
            LookupKey::PlaceId(value) | LookupKey::MapUrl(value) | LookupKey::Query(value) => {
                value
            }
        }
    }

    /// Cache key string: `pid:`, `url:` or `q:` followed by the input.
    pub fn cache_key(&self) -> String {
        match self {
            LookupKey::PlaceId(place_id) => format!("pid:{place_id}"),
            LookupKey::MapUrl(url) => format!("url:{url}"),
            LookupKey::Query(query) => format!("q:{query}"),
        }
    }
}

/// A row after resolution to a geographic point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStop {
    pub key: String,
    pub coordinate: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_map_url: Option<String>,
}

impl ResolvedStop {
    pub fn new(key: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            key: key.into(),
            coordinate,
            place_id: None,
            name: None,
            canonical_map_url: None,
        }
    }

    fn place_id(&self) -> Option<&str> {
        self.place_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Two stops are the same location if they share a non-empty place id or
/// their coordinates agree to within 1e-6 degrees.
pub fn same_stop(a: &ResolvedStop, b: &ResolvedStop) -> bool {
    if let (Some(left), Some(right)) = (a.place_id(), b.place_id())
        && left == right
    {
        return true;
    }
    a.coordinate.approx_eq(&b.coordinate, SAME_STOP_EPSILON)
}
