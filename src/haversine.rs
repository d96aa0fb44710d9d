//! Great-circle distances and a straight-line directions provider.
//!
//! [`StraightLineDirections`] joins stops with straight segments. It never
//! follows paths or roads, but needs no network, which makes it useful
//! offline and in demos.

use crate::error::DirectionsError;
use crate::itinerary::Coordinate;
use crate::polyline::encode;
use crate::traits::WalkingDirections;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Total length of a path in kilometers.
pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|pair| haversine_km(pair[0], pair[1])).sum()
}

/// Directions provider that connects stops with straight lines.
#[derive(Debug, Clone, Default)]
pub struct StraightLineDirections {
    /// Longest segment accepted, in kilometers. `None` accepts anything.
    pub max_segment_km: Option<f64>,
}

impl StraightLineDirections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_segment_km(mut self, km: f64) -> Self {
        self.max_segment_km = Some(km);
        self
    }
}

impl WalkingDirections for StraightLineDirections {
    async fn walking_path(&self, stops: &[Coordinate]) -> Result<String, DirectionsError> {
        if stops.len() < 2 {
            return Err(DirectionsError::TooFewStops(stops.len()));
        }
        if let Some(limit) = self.max_segment_km
            && stops.windows(2).any(|pair| haversine_km(pair[0], pair[1]) > limit)
        {
            return Err(DirectionsError::NoRoute(stops.len()));
        }
        Ok(encode(stops))
    }
}
