//! Debounced recomputation of day routes.
//!
//! The editor pushes a full itinerary snapshot after every edit. Snapshots
//! whose routing-relevant fields are unchanged (a memo or cost edit, say)
//! are dropped on arrival. Relevant ones restart the debounce window, and
//! when the window passes quietly the latest snapshot is routed on its own
//! task so that a later pass can overtake it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::itinerary::ItineraryRow;
use crate::router::{PassOutcome, RouteEngine};
use crate::traits::{PlaceLookup, PolylineSurface, WalkingDirections};

/// Default quiet window before a pass starts.
const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How long the itinerary must stay unchanged before routing.
    pub debounce: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl SchedulerConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// The part of a row that can change its route.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureEntry {
    id: String,
    day: u32,
    place_id: String,
    map_url: String,
    name: String,
}

/// Routing-relevant projection of an itinerary snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSignature(Vec<SignatureEntry>);

impl RoutingSignature {
    pub fn of(rows: &[ItineraryRow]) -> Self {
        Self(
            rows.iter()
                .map(|row| SignatureEntry {
                    id: row.id.clone(),
                    day: row.day,
                    place_id: row.place_id.clone(),
                    map_url: row.map_url.clone(),
                    name: row.name.trim().to_string(),
                })
                .collect(),
        )
    }
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    snapshots: mpsc::UnboundedSender<Vec<ItineraryRow>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Queues an itinerary snapshot. Returns `false` once the scheduler has stopped.
    pub fn submit(&self, rows: Vec<ItineraryRow>) -> bool {
        self.snapshots.send(rows).is_ok()
    }

    /// Stops accepting snapshots, flushes the pending one and waits for the
    /// last pass to finish.
    pub async fn shutdown(self) {
        drop(self.snapshots);
        if let Err(err) = self.task.await {
            debug!(error = %err, "route scheduler task ended abnormally");
        }
    }
}

/// Spawns the scheduler loop for `engine` on the current tokio runtime.
pub fn spawn<L, D, S>(engine: Arc<RouteEngine<L, D, S>>, config: SchedulerConfig) -> SchedulerHandle
where
    L: PlaceLookup + 'static,
    D: WalkingDirections + 'static,
    S: PolylineSurface + 'static,
{
    let (snapshots, receiver) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(engine, receiver, config));
    SchedulerHandle { snapshots, task }
}

async fn run<L, D, S>(
    engine: Arc<RouteEngine<L, D, S>>,
    mut receiver: mpsc::UnboundedReceiver<Vec<ItineraryRow>>,
    config: SchedulerConfig,
) where
    L: PlaceLookup + 'static,
    D: WalkingDirections + 'static,
    S: PolylineSurface + 'static,
{
    let mut last_seen: Option<RoutingSignature> = None;
    let mut last_pass: Option<JoinHandle<PassOutcome>> = None;

    while let Some(mut latest) = next_relevant(&mut receiver, &mut last_seen).await {
        let mut closed = false;
        loop {
            match tokio::time::timeout(config.debounce, next_relevant(&mut receiver, &mut last_seen)).await {
                Ok(Some(rows)) => latest = rows,
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        debug!(rows = latest.len(), "debounce window elapsed, starting routing pass");
        let engine = engine.clone();
        last_pass = Some(tokio::spawn(async move { engine.recompute(&latest).await }));

        if closed {
            break;
        }
    }

    if let Some(pass) = last_pass
        && let Err(err) = pass.await
    {
        debug!(error = %err, "routing pass task ended abnormally");
    }
}

/// Receives snapshots until one differs from the last relevant one.
async fn next_relevant(
    receiver: &mut mpsc::UnboundedReceiver<Vec<ItineraryRow>>,
    last_seen: &mut Option<RoutingSignature>,
) -> Option<Vec<ItineraryRow>> {
    while let Some(rows) = receiver.recv().await {
        let signature = RoutingSignature::of(&rows);
        if last_seen.as_ref() == Some(&signature) {
            debug!("snapshot has no routing-relevant change");
            continue;
        }
        *last_seen = Some(signature);
        return Some(rows);
    }
    None
}
