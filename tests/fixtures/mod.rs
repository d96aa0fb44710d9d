//! Test fixtures for itinerary-routes.
//!
//! Provides:
//! - Real stops along the Nakasendo in the Kiso valley
//! - Lookup and directions doubles that count or gate their calls
//! - Row builders

#![allow(dead_code)]

pub mod doubles;
pub mod kiso_valley_locations;

pub use doubles::*;
pub use kiso_valley_locations::*;

use itinerary_routes::itinerary::{Coordinate, ItineraryRow};
use itinerary_routes::render::DayRoute;

/// A row that resolves `location` by free-text search.
pub fn row(id: &str, day: u32, location: &Location) -> ItineraryRow {
    ItineraryRow::new(id, day).with_name(location.name)
}

/// Coordinates of the stops a drawn route passes through.
pub fn stop_coordinates(route: &DayRoute) -> Vec<Coordinate> {
    route.stops.iter().map(|stop| stop.coordinate).collect()
}
