//! Collaborator interfaces for the routing engine.
//!
//! The engine never talks to a geocoder, a directions service or a map
//! directly. Concrete adapters (Google, OSRM, in-memory surfaces) implement
//! these traits; tests substitute counting or gated doubles.

use std::future::Future;

use crate::error::{DirectionsError, LookupError};
use crate::itinerary::Coordinate;
use crate::polyline::Polyline;

/// A place returned by a details lookup or a text search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceMatch {
    pub place_id: Option<String>,
    pub name: Option<String>,
    /// `None` when the service returned the place without geometry.
    pub coordinate: Option<Coordinate>,
    pub canonical_map_url: Option<String>,
}

/// Where a map link points after following redirects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapLinkMatch {
    pub coordinate: Option<Coordinate>,
    pub place_id: Option<String>,
    /// The final URL after redirects.
    pub canonical_map_url: String,
}

/// Resolves itinerary sources to places.
pub trait PlaceLookup: Send + Sync {
    /// Looks up a place by its opaque identifier.
    fn place_details(
        &self,
        place_id: &str,
    ) -> impl Future<Output = Result<PlaceMatch, LookupError>> + Send;

    /// Follows a map link and extracts its coordinate and place id.
    fn resolve_map_link(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<MapLinkMatch, LookupError>> + Send;

    /// Runs a free-text search and returns the top-ranked result.
    fn search_text(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<PlaceMatch, LookupError>> + Send;
}

/// Computes walking paths through an ordered list of stops.
pub trait WalkingDirections: Send + Sync {
    /// Returns the encoded polyline for a walk through `stops` in order.
    ///
    /// Requires at least two stops; everything between the first and last
    /// is passed as a waypoint.
    fn walking_path(
        &self,
        stops: &[Coordinate],
    ) -> impl Future<Output = Result<String, DirectionsError>> + Send;
}

/// Handle to a polyline drawn on a map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId(pub u64);

/// The map that renders day polylines.
pub trait PolylineSurface: Send {
    fn create(&mut self, path: &Polyline, color: &str) -> DrawableId;

    /// Replaces the path and colour of an existing drawable in place.
    fn update(&mut self, id: DrawableId, path: &Polyline, color: &str);

    fn remove(&mut self, id: DrawableId);
}
