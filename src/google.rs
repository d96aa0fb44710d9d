//! Google Maps Platform adapter.
//!
//! Implements [`PlaceLookup`] on the Places web service (details and text
//! search) plus share-link resolution, and [`WalkingDirections`] on the
//! Directions web service.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{DirectionsError, LookupError};
use crate::itinerary::Coordinate;
use crate::map_link::parse_map_link;
use crate::traits::{MapLinkMatch, PlaceLookup, PlaceMatch, WalkingDirections};

/// Default base URL for the Maps web services.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Place Details fields needed to build a stop.
const DETAIL_FIELDS: &str = "place_id,name,geometry,url";

#[derive(Debug, Clone)]
pub struct GoogleMapsConfig {
    pub api_key: String,
    /// Base URL for the web services (overridable for testing)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Preferred language for place names, e.g. "ja" or "en"
    pub language: Option<String>,
}

impl GoogleMapsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            language: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct GoogleMapsClient {
    config: GoogleMapsConfig,
    http: reqwest::Client,
}

impl GoogleMapsClient {
    pub fn new(config: GoogleMapsConfig) -> Result<Self, reqwest::Error> {
        // The default redirect policy follows up to ten hops, which covers
        // share links such as maps.app.goo.gl.
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, http })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, reqwest::Error> {
        let mut request = self
            .http
            .get(self.url(endpoint))
            .query(params)
            .query(&[("key", self.config.api_key.as_str())]);
        if let Some(language) = &self.config.language {
            request = request.query(&[("language", language.as_str())]);
        }

        request.send().await?.error_for_status()?.json::<T>().await
    }
}

impl PlaceLookup for GoogleMapsClient {
    async fn place_details(&self, place_id: &str) -> Result<PlaceMatch, LookupError> {
        let body: DetailsResponse = self
            .get(
                "place/details/json",
                &[
                    ("place_id", place_id.to_string()),
                    ("fields", DETAIL_FIELDS.to_string()),
                ],
            )
            .await?;

        match body.status.as_str() {
            "OK" => body
                .result
                .map(PlaceResult::into_match)
                .ok_or_else(|| LookupError::NoResult(place_id.to_string())),
            "ZERO_RESULTS" | "NOT_FOUND" => Err(LookupError::NoResult(place_id.to_string())),
            _ => Err(LookupError::Status {
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            }),
        }
    }

    async fn resolve_map_link(&self, url: &str) -> Result<MapLinkMatch, LookupError> {
        let direct = parse_map_link(url)?;
        if direct.coordinate.is_some() {
            return Ok(MapLinkMatch {
                coordinate: direct.coordinate,
                place_id: direct.place_id,
                canonical_map_url: url.to_string(),
            });
        }

        let response = self.http.get(url.trim()).send().await?;
        let final_url = response.url().to_string();
        let target = parse_map_link(&final_url)?;

        Ok(MapLinkMatch {
            coordinate: target.coordinate,
            place_id: target.place_id.or(direct.place_id),
            canonical_map_url: final_url,
        })
    }

    async fn search_text(&self, query: &str) -> Result<PlaceMatch, LookupError> {
        let body: SearchResponse = self
            .get("place/textsearch/json", &[("query", query.to_string())])
            .await?;

        match body.status.as_str() {
            "OK" => body
                .results
                .into_iter()
                .next()
                .map(PlaceResult::into_match)
                .ok_or_else(|| LookupError::NoResult(query.to_string())),
            "ZERO_RESULTS" => Err(LookupError::NoResult(query.to_string())),
            _ => Err(LookupError::Status {
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            }),
        }
    }
}

impl WalkingDirections for GoogleMapsClient {
    async fn walking_path(&self, stops: &[Coordinate]) -> Result<String, DirectionsError> {
        let (Some(origin), Some(destination)) = (stops.first(), stops.last()) else {
            return Err(DirectionsError::TooFewStops(stops.len()));
        };
        if stops.len() < 2 {
            return Err(DirectionsError::TooFewStops(stops.len()));
        }

        let mut params = vec![
            ("origin", lat_lng(origin)),
            ("destination", lat_lng(destination)),
            ("mode", "walking".to_string()),
        ];
        let waypoints = &stops[1..stops.len() - 1];
        if !waypoints.is_empty() {
            let joined = waypoints.iter().map(lat_lng).collect::<Vec<_>>().join("|");
            params.push(("waypoints", joined));
        }

        let body: DirectionsResponse = self.get("directions/json", &params).await?;

        match body.status.as_str() {
            "OK" => body
                .routes
                .into_iter()
                .next()
                .map(|route| route.overview_polyline.points)
                .filter(|points| !points.is_empty())
                .ok_or(DirectionsError::NoRoute(stops.len())),
            "ZERO_RESULTS" | "NOT_FOUND" => Err(DirectionsError::NoRoute(stops.len())),
            _ => Err(DirectionsError::Status {
                status: body.status,
                message: body.error_message.unwrap_or_default(),
            }),
        }
    }
}

fn lat_lng(point: &Coordinate) -> String {
    format!("{:.6},{:.6}", point.lat, point.lng)
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: Option<String>,
    name: Option<String>,
    geometry: Option<Geometry>,
    url: Option<String>,
}

impl PlaceResult {
    fn into_match(self) -> PlaceMatch {
        PlaceMatch {
            place_id: self.place_id,
            name: self.name,
            coordinate: self
                .geometry
                .map(|geometry| Coordinate::new(geometry.location.lat, geometry.location.lng)),
            canonical_map_url: self.url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: OverviewPolyline,
}

#[derive(Debug, Deserialize)]
struct OverviewPolyline {
    points: String,
}
