//! In-memory lookup and directions doubles.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, oneshot};

use itinerary_routes::error::{DirectionsError, LookupError};
use itinerary_routes::itinerary::Coordinate;
use itinerary_routes::map_link::parse_map_link;
use itinerary_routes::polyline::encode;
use itinerary_routes::traits::{MapLinkMatch, PlaceLookup, PlaceMatch, WalkingDirections};

use super::kiso_valley_locations::{Location, all_locations};

/// Resolves fixture locations by name or place id and counts every call.
#[derive(Default)]
pub struct FixtureLookup {
    places: Vec<Location>,
    links: HashMap<String, Coordinate>,
    failing: Mutex<HashSet<String>>,
    pub details_calls: AtomicUsize,
    pub link_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl FixtureLookup {
    pub fn new(places: Vec<Location>) -> Self {
        Self {
            places,
            ..Self::default()
        }
    }

    pub fn kiso() -> Self {
        Self::new(all_locations())
    }

    /// Resolves `url` to `coordinate` instead of parsing it.
    pub fn with_link(mut self, url: &str, coordinate: Coordinate) -> Self {
        self.links.insert(url.to_string(), coordinate);
        self
    }

    /// Makes every lookup of `input` fail from now on.
    pub fn fail_on(&self, input: &str) {
        self.failing.lock().unwrap().insert(input.to_string());
    }

    pub fn total_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
            + self.link_calls.load(Ordering::SeqCst)
            + self.search_calls.load(Ordering::SeqCst)
    }

    fn check(&self, input: &str) -> Result<(), LookupError> {
        if self.failing.lock().unwrap().contains(input) {
            return Err(LookupError::Status {
                status: "UNKNOWN_ERROR".into(),
                message: format!("injected failure for {input}"),
            });
        }
        Ok(())
    }

    fn matched(location: &Location) -> PlaceMatch {
        PlaceMatch {
            place_id: Some(location.place_id.to_string()),
            name: Some(location.name.to_string()),
            coordinate: Some(location.coordinate()),
            canonical_map_url: None,
        }
    }
}

impl PlaceLookup for FixtureLookup {
    async fn place_details(&self, place_id: &str) -> Result<PlaceMatch, LookupError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.check(place_id)?;
        self.places
            .iter()
            .find(|location| location.place_id == place_id)
            .map(Self::matched)
            .ok_or_else(|| LookupError::NoResult(place_id.to_string()))
    }

    async fn resolve_map_link(&self, url: &str) -> Result<MapLinkMatch, LookupError> {
        self.link_calls.fetch_add(1, Ordering::SeqCst);
        self.check(url)?;
        if let Some(coordinate) = self.links.get(url) {
            return Ok(MapLinkMatch {
                coordinate: Some(*coordinate),
                place_id: None,
                canonical_map_url: url.to_string(),
            });
        }
        let target = parse_map_link(url)?;
        Ok(MapLinkMatch {
            coordinate: target.coordinate,
            place_id: target.place_id,
            canonical_map_url: url.to_string(),
        })
    }

    async fn search_text(&self, query: &str) -> Result<PlaceMatch, LookupError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check(query)?;
        self.places
            .iter()
            .find(|location| location.name == query)
            .map(Self::matched)
            .ok_or_else(|| LookupError::NoResult(query.to_string()))
    }
}

/// Records each request and answers with the stops joined by straight lines.
#[derive(Default)]
pub struct RecordingDirections {
    calls: Mutex<Vec<Vec<Coordinate>>>,
    failing: AtomicBool,
    fixed: Mutex<Option<String>>,
}

impl RecordingDirections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Answers every later request with `encoded`.
    pub fn respond_with(&self, encoded: &str) {
        *self.fixed.lock().unwrap() = Some(encoded.to_string());
    }

    pub fn calls(&self) -> Vec<Vec<Coordinate>> {
        self.calls.lock().unwrap().clone()
    }
}

impl WalkingDirections for RecordingDirections {
    async fn walking_path(&self, stops: &[Coordinate]) -> Result<String, DirectionsError> {
        self.calls.lock().unwrap().push(stops.to_vec());
        if self.failing.load(Ordering::SeqCst) {
            return Err(DirectionsError::NoRoute(stops.len()));
        }
        let fixed = self.fixed.lock().unwrap().clone();
        Ok(fixed.unwrap_or_else(|| encode(stops)))
    }
}

/// Holds the first request until released; later requests pass straight through.
pub struct GatedDirections {
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    entered: Arc<Notify>,
}

impl GatedDirections {
    /// Returns the directions, the sender that opens the gate, and a notifier
    /// fired when the first request reaches the gate.
    pub fn new() -> (Self, oneshot::Sender<()>, Arc<Notify>) {
        let (open, gate) = oneshot::channel();
        let entered = Arc::new(Notify::new());
        let directions = Self {
            gate: Mutex::new(Some(gate)),
            entered: entered.clone(),
        };
        (directions, open, entered)
    }
}

impl WalkingDirections for GatedDirections {
    async fn walking_path(&self, stops: &[Coordinate]) -> Result<String, DirectionsError> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            self.entered.notify_one();
            let _ = gate.await;
        }
        Ok(encode(stops))
    }
}
