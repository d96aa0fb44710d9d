//! Stops along the Nakasendo through the Kiso valley.
//!
//! Coordinates are approximate town centres and trail landmarks, routable
//! with the OSRM foot profile on Geofabrik's Chubu extract.

use itinerary_routes::itinerary::Coordinate;

/// A named stop with a stable place id.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub name: &'static str,
    pub place_id: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, place_id: &'static str, lat: f64, lng: f64) -> Self {
        Self {
            name,
            place_id,
            lat,
            lng,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// A map link that carries the coordinate in its path.
    pub fn map_url(&self) -> String {
        format!(
            "https://www.google.com/maps/place/{}/@{},{},17z",
            self.name.replace(' ', "+"),
            self.lat,
            self.lng
        )
    }
}

// ============================================================================
// Post towns
// ============================================================================

pub const TSUMAGO: Location = Location::new("Tsumago-juku", "ChIJtsumago", 35.5767, 137.5958);
pub const MAGOME: Location = Location::new("Magome-juku", "ChIJmagome", 35.5256, 137.5650);
pub const NARAI: Location = Location::new("Narai-juku", "ChIJnarai", 35.9663, 137.8140);
pub const KISO_FUKUSHIMA: Location =
    Location::new("Kiso-Fukushima", "ChIJkisofukushima", 35.8430, 137.6930);

pub const POST_TOWNS: &[Location] = &[TSUMAGO, MAGOME, NARAI, KISO_FUKUSHIMA];

// ============================================================================
// Trail landmarks between Magome and Tsumago
// ============================================================================

pub const MAGOME_PASS: Location = Location::new("Magome Pass", "ChIJmagometoge", 35.5416, 137.5804);
pub const OTAKI_MEDAKI: Location =
    Location::new("Otaki Medaki Falls", "ChIJotakimedaki", 35.5530, 137.5747);
pub const OTSUMAGO: Location = Location::new("Otsumago", "ChIJotsumago", 35.5640, 137.5870);

pub const TRAIL_STOPS: &[Location] = &[MAGOME_PASS, OTAKI_MEDAKI, OTSUMAGO];

// ============================================================================
// Stations
// ============================================================================

pub const NAGISO_STATION: Location =
    Location::new("Nagiso Station", "ChIJnagiso", 35.5928, 137.6089);
pub const NAKATSUGAWA_STATION: Location =
    Location::new("Nakatsugawa Station", "ChIJnakatsugawa", 35.4953, 137.5023);

pub const STATIONS: &[Location] = &[NAGISO_STATION, NAKATSUGAWA_STATION];

/// Every fixture location.
pub fn all_locations() -> Vec<Location> {
    let mut all = Vec::with_capacity(POST_TOWNS.len() + TRAIL_STOPS.len() + STATIONS.len());
    all.extend_from_slice(POST_TOWNS);
    all.extend_from_slice(TRAIL_STOPS);
    all.extend_from_slice(STATIONS);
    all
}

/// The classic day walk, south to north.
pub fn magome_to_tsumago() -> Vec<Location> {
    vec![MAGOME, MAGOME_PASS, OTAKI_MEDAKI, OTSUMAGO, TSUMAGO]
}
