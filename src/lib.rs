//! itinerary-routes
//!
//! Draws one walking route per day of a trip itinerary. Rows are resolved to
//! stops through a place lookup (place id, map link or free-text search),
//! joined into walking paths by a directions provider, and kept on a map
//! surface that is only ever written by the most recent routing pass.

pub mod cache;
pub mod error;
pub mod google;
pub mod haversine;
pub mod itinerary;
pub mod map_link;
pub mod osrm;
pub mod osrm_data;
pub mod polyline;
pub mod render;
pub mod resolver;
pub mod router;
pub mod scheduler;
pub mod traits;

pub use error::{DirectionsError, LookupError};
pub use itinerary::{Coordinate, ItineraryRow, ResolvedStop};
pub use router::{DayOutcome, PassOutcome, RouteEngine, RouterOptions};
