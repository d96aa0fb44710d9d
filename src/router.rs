//! Day router: turns an itinerary snapshot into one walking route per day.
//!
//! Each call to [`RouteEngine::recompute`] is a *pass* stamped with a new
//! generation. Passes walk the day slots in ascending order, resolving rows
//! to stops and carrying the last resolved stop forward so a day's route can
//! start where the previous non-empty day ended. Render writes are buffered
//! and only committed if no newer pass has started in the meantime.
//!
//! Failures never erase what is already on the map: a day whose rows all
//! fail to resolve, or whose directions call fails, keeps its previous path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{AbortHandle, Abortable, join_all};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::itinerary::{Coordinate, ItineraryRow, ResolvedStop, same_stop};
use crate::polyline::Polyline;
use crate::render::{DayRoute, RouteRenderState};
use crate::resolver::StopResolver;
use crate::traits::{PlaceLookup, PolylineSurface, WalkingDirections};

/// Default colour cycle for day routes.
pub const DEFAULT_PALETTE: [&str; 4] = ["#e6194b", "#3cb44b", "#4363d8", "#f58231"];

#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Number of day slots, numbered from 1.
    pub day_count: u32,
    /// Route colours, cycled by day index.
    pub palette: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            day_count: 5,
            palette: DEFAULT_PALETTE.iter().map(|color| color.to_string()).collect(),
        }
    }
}

impl RouterOptions {
    pub fn with_day_count(mut self, day_count: u32) -> Self {
        self.day_count = day_count;
        self
    }

    pub fn with_palette(mut self, palette: Vec<String>) -> Self {
        self.palette = palette;
        self
    }

    /// Colour for a 1-based day index.
    pub fn color_for(&self, day: u32) -> &str {
        let index = day.saturating_sub(1) as usize;
        match self.palette.len() {
            0 => DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()],
            len => self.palette[index % len].as_str(),
        }
    }
}

/// What a pass decided for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOutcome {
    /// No row had a usable source; the route was cleared.
    NoCandidates,
    /// Every candidate failed to resolve; the route was kept.
    Unresolved,
    /// Only one stop was available; the route was cleared.
    SingleStop,
    /// The directions call failed; the route was kept.
    RoutingFailed,
    /// A new path was drawn.
    Drawn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub generation: u64,
    /// One entry per day slot, in day order.
    pub days: Vec<(u32, DayOutcome)>,
}

impl PassSummary {
    pub fn outcome(&self, day: u32) -> Option<DayOutcome> {
        self.days
            .iter()
            .find(|(slot, _)| *slot == day)
            .map(|(_, outcome)| *outcome)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The pass finished and its writes are on the map.
    Committed(PassSummary),
    /// A newer pass started first; nothing was written.
    Superseded,
}

impl PassOutcome {
    pub fn summary(&self) -> Option<&PassSummary> {
        match self {
            PassOutcome::Committed(summary) => Some(summary),
            PassOutcome::Superseded => None,
        }
    }
}

/// A render write buffered until the pass commits.
enum RenderOp {
    Draw {
        day: u32,
        stops: Vec<Arc<ResolvedStop>>,
        path: Polyline,
    },
    Clear(u32),
}

/// Resolves itinerary rows and keeps one walking route per day on a surface.
pub struct RouteEngine<L, D, S: PolylineSurface> {
    resolver: StopResolver<L>,
    directions: D,
    render: Mutex<RouteRenderState<S>>,
    generation: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
    options: RouterOptions,
}

impl<L, D, S> RouteEngine<L, D, S>
where
    L: PlaceLookup,
    D: WalkingDirections,
    S: PolylineSurface,
{
    pub fn new(resolver: StopResolver<L>, directions: D, surface: S, options: RouterOptions) -> Self {
        Self {
            resolver,
            directions,
            render: Mutex::new(RouteRenderState::new(surface)),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            options,
        }
    }

    pub fn resolver(&self) -> &StopResolver<L> {
        &self.resolver
    }

    pub fn directions(&self) -> &D {
        &self.directions
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Generation of the most recently started pass.
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Snapshot of the drawn routes in day order.
    pub fn routes(&self) -> Vec<DayRoute> {
        self.lock_render().routes().cloned().collect()
    }

    pub fn route(&self, day: u32) -> Option<DayRoute> {
        self.lock_render().route(day).cloned()
    }

    /// Runs `f` against the render state under its lock.
    pub fn with_render_state<T>(&self, f: impl FnOnce(&mut RouteRenderState<S>) -> T) -> T {
        f(&mut self.lock_render())
    }

    /// Removes every drawn route, e.g. when the map is torn down.
    pub fn release(&self) {
        if let Some(handle) = self.lock_in_flight().take() {
            handle.abort();
        }
        self.lock_render().release_all();
    }

    /// Recomputes every day's route from an itinerary snapshot.
    ///
    /// Starting a pass aborts the previous one if it is still waiting on the
    /// network. A pass that is overtaken returns [`PassOutcome::Superseded`]
    /// without touching the render state.
    pub async fn recompute(&self, rows: &[ItineraryRow]) -> PassOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (handle, registration) = AbortHandle::new_pair();
        let previous = self.lock_in_flight().replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        match Abortable::new(self.run_pass(generation, rows), registration).await {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!(generation, "routing pass aborted");
                PassOutcome::Superseded
            }
        }
    }

    async fn run_pass(&self, generation: u64, rows: &[ItineraryRow]) -> PassOutcome {
        let mut ops = Vec::new();
        let mut days = Vec::with_capacity(self.options.day_count as usize);
        let mut last_stop: Option<Arc<ResolvedStop>> = None;

        for day in 1..=self.options.day_count {
            let candidates: Vec<&ItineraryRow> = rows
                .iter()
                .filter(|row| row.day == day && row.is_candidate())
                .collect();

            if candidates.is_empty() {
                ops.push(RenderOp::Clear(day));
                days.push((day, DayOutcome::NoCandidates));
                continue;
            }

            let resolved = join_all(candidates.iter().map(|row| self.resolver.resolve_row(row))).await;
            if self.is_stale(generation) {
                debug!(generation, day, "dropping stale pass after stop resolution");
                return PassOutcome::Superseded;
            }

            let own_stops: Vec<Arc<ResolvedStop>> = resolved.into_iter().flatten().collect();
            let (Some(first), Some(last)) = (own_stops.first().cloned(), own_stops.last().cloned())
            else {
                warn!(day, candidates = candidates.len(), "no stop resolved, keeping previous route");
                days.push((day, DayOutcome::Unresolved));
                continue;
            };

            let mut route_stops = Vec::with_capacity(own_stops.len() + 1);
            if let Some(bridge) = last_stop.take()
                && !same_stop(&bridge, &first)
            {
                route_stops.push(bridge);
            }
            route_stops.extend(own_stops);
            last_stop = Some(last);

            if route_stops.len() < 2 {
                ops.push(RenderOp::Clear(day));
                days.push((day, DayOutcome::SingleStop));
                continue;
            }

            let coordinates: Vec<Coordinate> =
                route_stops.iter().map(|stop| stop.coordinate).collect();
            let result = self.directions.walking_path(&coordinates).await;
            if self.is_stale(generation) {
                debug!(generation, day, "dropping stale pass after directions");
                return PassOutcome::Superseded;
            }

            let outcome = match result {
                Ok(encoded) => {
                    let path = Polyline::from_encoded(&encoded);
                    if path.is_empty() {
                        warn!(day, "directions returned an empty or malformed path, keeping previous route");
                        DayOutcome::RoutingFailed
                    } else {
                        ops.push(RenderOp::Draw {
                            day,
                            stops: route_stops,
                            path,
                        });
                        DayOutcome::Drawn
                    }
                }
                Err(err) => {
                    warn!(day, stops = coordinates.len(), error = %err, "walking directions failed, keeping previous route");
                    DayOutcome::RoutingFailed
                }
            };
            days.push((day, outcome));
        }

        self.commit(generation, ops, days)
    }

    fn commit(&self, generation: u64, ops: Vec<RenderOp>, days: Vec<(u32, DayOutcome)>) -> PassOutcome {
        let mut render = self.lock_render();
        if self.is_stale(generation) {
            debug!(generation, "dropping stale pass before commit");
            return PassOutcome::Superseded;
        }

        let mut drawn = 0;
        for op in ops {
            match op {
                RenderOp::Draw { day, stops, path } => {
                    render.set_or_update(day, stops, path, self.options.color_for(day), generation);
                    drawn += 1;
                }
                RenderOp::Clear(day) => {
                    render.clear(day);
                }
            }
        }
        info!(generation, drawn, "routing pass committed");

        PassOutcome::Committed(PassSummary { generation, days })
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    fn lock_render(&self) -> MutexGuard<'_, RouteRenderState<S>> {
        self.render.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
