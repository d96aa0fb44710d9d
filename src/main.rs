use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use itinerary_routes::error::{DirectionsError, LookupError};
use itinerary_routes::google::{GoogleMapsClient, GoogleMapsConfig};
use itinerary_routes::haversine::StraightLineDirections;
use itinerary_routes::itinerary::{Coordinate, ItineraryRow};
use itinerary_routes::map_link::OfflineLinkLookup;
use itinerary_routes::osrm::{OsrmClient, OsrmConfig};
use itinerary_routes::render::{DayRoute, MemorySurface};
use itinerary_routes::resolver::StopResolver;
use itinerary_routes::router::{PassOutcome, PassSummary, RouteEngine, RouterOptions};
use itinerary_routes::traits::{MapLinkMatch, PlaceLookup, PlaceMatch, WalkingDirections};

/// Routes each day of an itinerary and prints the resulting paths as JSON.
#[derive(Debug, Parser)]
#[command(name = "itinerary-routes", version)]
struct Args {
    /// JSON file holding an array of itinerary rows
    itinerary: PathBuf,

    /// Google Maps Platform key, used for place lookups and directions
    #[arg(long, env = "GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Route with an OSRM server (foot profile) instead of Google
    #[arg(long, conflicts_with = "straight_line")]
    osrm_url: Option<String>,

    /// Join stops with straight lines, no directions service
    #[arg(long)]
    straight_line: bool,

    /// Number of day slots to route
    #[arg(long, default_value_t = 5)]
    days: u32,

    /// Preferred language for place names
    #[arg(long)]
    language: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid itinerary JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no directions provider: pass --api-key, --osrm-url or --straight-line")]
    NoDirections,

    #[error("routing pass was superseded")]
    Superseded,
}

/// Place lookup chosen at startup.
enum Lookup {
    Google(GoogleMapsClient),
    Offline(OfflineLinkLookup),
}

impl PlaceLookup for Lookup {
    async fn place_details(&self, place_id: &str) -> Result<PlaceMatch, LookupError> {
        match self {
            Lookup::Google(client) => client.place_details(place_id).await,
            Lookup::Offline(lookup) => lookup.place_details(place_id).await,
        }
    }

    async fn resolve_map_link(&self, url: &str) -> Result<MapLinkMatch, LookupError> {
        match self {
            Lookup::Google(client) => client.resolve_map_link(url).await,
            Lookup::Offline(lookup) => lookup.resolve_map_link(url).await,
        }
    }

    async fn search_text(&self, query: &str) -> Result<PlaceMatch, LookupError> {
        match self {
            Lookup::Google(client) => client.search_text(query).await,
            Lookup::Offline(lookup) => lookup.search_text(query).await,
        }
    }
}

/// Directions provider chosen at startup.
enum Directions {
    Google(GoogleMapsClient),
    Osrm(OsrmClient),
    StraightLine(StraightLineDirections),
}

impl WalkingDirections for Directions {
    async fn walking_path(&self, stops: &[Coordinate]) -> Result<String, DirectionsError> {
        match self {
            Directions::Google(client) => client.walking_path(stops).await,
            Directions::Osrm(client) => client.walking_path(stops).await,
            Directions::StraightLine(lines) => lines.walking_path(stops).await,
        }
    }
}

#[derive(Serialize)]
struct Report {
    summary: PassSummary,
    routes: Vec<DayRoute>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "itinerary_routes=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(Args::parse()).await {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&args.itinerary).map_err(|source| CliError::Read {
        path: args.itinerary.clone(),
        source,
    })?;
    let rows: Vec<ItineraryRow> = serde_json::from_str(&text)?;
    tracing::info!(rows = rows.len(), path = %args.itinerary.display(), "loaded itinerary");

    let google = match &args.api_key {
        Some(key) => {
            let mut config = GoogleMapsConfig::new(key.clone());
            if let Some(language) = &args.language {
                config = config.with_language(language.clone());
            }
            Some(GoogleMapsClient::new(config)?)
        }
        None => None,
    };

    let directions = if args.straight_line {
        Directions::StraightLine(StraightLineDirections::new())
    } else if let Some(base_url) = &args.osrm_url {
        Directions::Osrm(OsrmClient::new(OsrmConfig {
            base_url: base_url.clone(),
            ..OsrmConfig::default()
        })?)
    } else if let Some(client) = &google {
        Directions::Google(client.clone())
    } else {
        return Err(CliError::NoDirections);
    };

    let lookup = match google {
        Some(client) => Lookup::Google(client),
        None => {
            tracing::warn!("no API key, only map links with coordinates will resolve");
            Lookup::Offline(OfflineLinkLookup)
        }
    };

    let engine = RouteEngine::new(
        StopResolver::new(lookup),
        directions,
        MemorySurface::new(),
        RouterOptions::default().with_day_count(args.days),
    );

    let summary = match engine.recompute(&rows).await {
        PassOutcome::Committed(summary) => summary,
        PassOutcome::Superseded => return Err(CliError::Superseded),
    };
    let report = Report {
        summary,
        routes: engine.routes(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
