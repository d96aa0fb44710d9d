//! Coordinate and place-id extraction from map links.
//!
//! Handles the URL shapes people paste into an itinerary after following
//! share-link redirects:
//!
//! - `https://www.google.com/maps/place/Tsumago/@35.5767,137.5958,17z/...`
//! - `https://maps.google.com/?q=35.5767,137.5958`
//! - `https://www.google.com/maps/search/?api=1&query=loc:35.57,137.59`
//! - `https://maps.google.com/?ll=35.5767,137.5958&z=15`
//! - `https://www.google.com/maps/search/?api=1&query=Tsumago&query_place_id=ChIJ...`
//! - `https://maps.google.com/?q=place_id:ChIJ...`

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use crate::error::LookupError;
use crate::itinerary::Coordinate;
use crate::traits::{MapLinkMatch, PlaceLookup, PlaceMatch};

static AT_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?)").expect("valid @lat,lng pattern")
});

static LAT_LNG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*$").expect("valid lat,lng pattern")
});

static PLACE_ID_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"place_id:([A-Za-z0-9_-]+)").expect("valid place_id pattern")
});

/// Query parameters that may carry a `lat,lng` pair, in lookup order.
const COORDINATE_PARAMS: [&str; 3] = ["q", "query", "ll"];

/// Query parameters that carry a bare place id.
const PLACE_ID_PARAMS: [&str; 2] = ["place_id", "query_place_id"];

/// What a map link points at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapLinkTarget {
    pub coordinate: Option<Coordinate>,
    pub place_id: Option<String>,
}

/// Extracts the coordinate and place id encoded in a map link.
///
/// An `@lat,lng` path segment wins over query parameters. Out-of-range
/// coordinates are treated as absent.
pub fn parse_map_link(link: &str) -> Result<MapLinkTarget, LookupError> {
    let url = Url::parse(link.trim()).map_err(|_| LookupError::InvalidLink(link.to_string()))?;
    Ok(MapLinkTarget {
        coordinate: coordinate_from_path(&url).or_else(|| coordinate_from_query(&url)),
        place_id: place_id_from(&url),
    })
}

fn coordinate_from_path(url: &Url) -> Option<Coordinate> {
    let captures = AT_SEGMENT.captures(url.path())?;
    coordinate(&captures[1], &captures[2])
}

fn coordinate_from_query(url: &Url) -> Option<Coordinate> {
    COORDINATE_PARAMS.iter().find_map(|name| {
        let value = query_value(url, name)?;
        let value = value.strip_prefix("loc:").unwrap_or(value.as_str());
        let captures = LAT_LNG.captures(value)?;
        coordinate(&captures[1], &captures[2])
    })
}

fn place_id_from(url: &Url) -> Option<String> {
    let from_params = PLACE_ID_PARAMS
        .iter()
        .filter_map(|name| query_value(url, name))
        .find(|value| !value.is_empty());
    if from_params.is_some() {
        return from_params;
    }

    url.query_pairs()
        .find_map(|(_, value)| place_id_token(&value))
        .or_else(|| place_id_token(url.path()))
}

fn place_id_token(text: &str) -> Option<String> {
    PLACE_ID_TOKEN.captures(text).map(|captures| captures[1].to_string())
}

fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string())
}

fn coordinate(lat: &str, lng: &str) -> Option<Coordinate> {
    let point = Coordinate::new(lat.parse().ok()?, lng.parse().ok()?);
    point.is_valid().then_some(point)
}

/// Lookup that only understands map links carrying their own coordinates.
///
/// Needs no network or credentials. Place ids and free-text queries always
/// fail with [`LookupError::NoResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineLinkLookup;

impl PlaceLookup for OfflineLinkLookup {
    async fn place_details(&self, place_id: &str) -> Result<PlaceMatch, LookupError> {
        Err(LookupError::NoResult(place_id.to_string()))
    }

    async fn resolve_map_link(&self, url: &str) -> Result<MapLinkMatch, LookupError> {
        let target = parse_map_link(url)?;
        Ok(MapLinkMatch {
            coordinate: target.coordinate,
            place_id: target.place_id,
            canonical_map_url: url.trim().to_string(),
        })
    }

    async fn search_text(&self, query: &str) -> Result<PlaceMatch, LookupError> {
        Err(LookupError::NoResult(query.to_string()))
    }
}
