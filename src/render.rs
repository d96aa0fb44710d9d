//! Per-day route render state.
//!
//! Holds at most one drawable per day slot. Updates reuse the existing
//! drawable so the map never flashes an empty day between two paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::itinerary::ResolvedStop;
use crate::polyline::Polyline;
use crate::traits::{DrawableId, PolylineSurface};

/// The route currently drawn for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayRoute {
    pub day: u32,
    /// Stops the path was computed through, bridge stop included.
    pub stops: Vec<Arc<ResolvedStop>>,
    pub path: Polyline,
    pub color: String,
    /// Generation of the pass that produced this path.
    pub generation: u64,
    #[serde(skip)]
    drawable: DrawableId,
}

impl DayRoute {
    pub fn drawable(&self) -> DrawableId {
        self.drawable
    }
}

/// Day routes keyed by day index, mirrored onto a [`PolylineSurface`].
pub struct RouteRenderState<S: PolylineSurface> {
    surface: S,
    routes: BTreeMap<u32, DayRoute>,
}

impl<S: PolylineSurface> RouteRenderState<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            routes: BTreeMap::new(),
        }
    }

    /// Draws `path` for `day`, updating the existing drawable if there is one.
    pub fn set_or_update(
        &mut self,
        day: u32,
        stops: Vec<Arc<ResolvedStop>>,
        path: Polyline,
        color: &str,
        generation: u64,
    ) {
        match self.routes.get_mut(&day) {
            Some(route) => {
                self.surface.update(route.drawable, &path, color);
                route.stops = stops;
                route.path = path;
                route.color = color.to_string();
                route.generation = generation;
            }
            None => {
                let drawable = self.surface.create(&path, color);
                self.routes.insert(
                    day,
                    DayRoute {
                        day,
                        stops,
                        path,
                        color: color.to_string(),
                        generation,
                        drawable,
                    },
                );
            }
        }
    }

    /// Removes the route for `day`. Returns whether one was drawn.
    pub fn clear(&mut self, day: u32) -> bool {
        match self.routes.remove(&day) {
            Some(route) => {
                self.surface.remove(route.drawable);
                true
            }
            None => false,
        }
    }

    pub fn route(&self, day: u32) -> Option<&DayRoute> {
        self.routes.get(&day)
    }

    /// Drawn routes in ascending day order.
    pub fn routes(&self) -> impl Iterator<Item = &DayRoute> {
        self.routes.values()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Removes every drawable from the surface.
    pub fn release_all(&mut self) {
        for (_, route) in std::mem::take(&mut self.routes) {
            self.surface.remove(route.drawable);
        }
    }
}

impl<S: PolylineSurface> Drop for RouteRenderState<S> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Something that happened on a [`MemorySurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Created(DrawableId),
    Updated(DrawableId),
    Removed(DrawableId),
}

#[derive(Debug, Default)]
struct SurfaceLog {
    next_id: u64,
    live: HashMap<DrawableId, (Polyline, String)>,
    events: Vec<SurfaceEvent>,
}

/// In-memory surface for headless use and tests.
///
/// Clones share the same log, so a caller can keep a handle after moving
/// the surface into a render state.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut SurfaceLog) -> T) -> T {
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut log)
    }

    /// Number of drawables currently on the surface.
    pub fn live_count(&self) -> usize {
        self.with_log(|log| log.live.len())
    }

    /// Path and colour of a live drawable.
    pub fn drawn(&self, id: DrawableId) -> Option<(Polyline, String)> {
        self.with_log(|log| log.live.get(&id).cloned())
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.with_log(|log| log.events.clone())
    }
}

impl PolylineSurface for MemorySurface {
    fn create(&mut self, path: &Polyline, color: &str) -> DrawableId {
        self.with_log(|log| {
            log.next_id += 1;
            let id = DrawableId(log.next_id);
            log.live.insert(id, (path.clone(), color.to_string()));
            log.events.push(SurfaceEvent::Created(id));
            id
        })
    }

    fn update(&mut self, id: DrawableId, path: &Polyline, color: &str) {
        self.with_log(|log| {
            log.live.insert(id, (path.clone(), color.to_string()));
            log.events.push(SurfaceEvent::Updated(id));
        })
    }

    fn remove(&mut self, id: DrawableId) {
        self.with_log(|log| {
            log.live.remove(&id);
            log.events.push(SurfaceEvent::Removed(id));
        })
    }
}
