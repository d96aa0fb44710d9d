//! Row-to-stop resolution with caching.

use std::sync::Arc;

use tracing::warn;

use crate::cache::ResolutionCache;
use crate::error::LookupError;
use crate::itinerary::{ItineraryRow, LookupKey, ResolvedStop};
use crate::traits::{MapLinkMatch, PlaceLookup, PlaceMatch};

/// Resolves itinerary rows to stops through a [`PlaceLookup`], memoising
/// successful lookups in a [`ResolutionCache`].
pub struct StopResolver<L> {
    lookup: L,
    cache: ResolutionCache,
}

impl<L: PlaceLookup> StopResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_cache(lookup, ResolutionCache::new())
    }

    pub fn with_cache(lookup: L, cache: ResolutionCache) -> Self {
        Self { lookup, cache }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolves one row, or returns `None` if it has no usable source or the
    /// lookup failed. Failures are logged, never returned.
    pub async fn resolve_row(&self, row: &ItineraryRow) -> Option<Arc<ResolvedStop>> {
        let key = LookupKey::for_row(row)?;
        self.cache
            .get_or_resolve(&key, || async {
                match self.fetch(&key).await {
                    Ok(stop) => Some(stop),
                    Err(err) => {
                        warn!(row = %row.id, day = row.day, key = %key.cache_key(), error = %err, "could not resolve stop");
                        None
                    }
                }
            })
            .await
    }

    async fn fetch(&self, key: &LookupKey) -> Result<ResolvedStop, LookupError> {
        match key {
            LookupKey::PlaceId(place_id) => {
                let place = self.lookup.place_details(place_id).await?;
                stop_from_place(key, place)
            }
            LookupKey::MapUrl(url) => {
                let link = self.lookup.resolve_map_link(url).await?;
                stop_from_link(key, link)
            }
            LookupKey::Query(query) => {
                let place = self.lookup.search_text(query).await?;
                stop_from_place(key, place)
            }
        }
    }
}

fn stop_from_place(key: &LookupKey, place: PlaceMatch) -> Result<ResolvedStop, LookupError> {
    let coordinate = place
        .coordinate
        .ok_or_else(|| LookupError::MissingGeometry(key.input().to_string()))?;

    let place_id = match key {
        LookupKey::PlaceId(requested) => place.place_id.or_else(|| Some(requested.clone())),
        _ => place.place_id,
    };

    Ok(ResolvedStop {
        key: key.cache_key(),
        coordinate,
        place_id,
        name: place.name,
        canonical_map_url: place.canonical_map_url,
    })
}

fn stop_from_link(key: &LookupKey, link: MapLinkMatch) -> Result<ResolvedStop, LookupError> {
    let coordinate = link
        .coordinate
        .ok_or_else(|| LookupError::MissingGeometry(key.input().to_string()))?;

    Ok(ResolvedStop {
        key: key.cache_key(),
        coordinate,
        place_id: link.place_id,
        name: None,
        canonical_map_url: Some(link.canonical_map_url).filter(|url| !url.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::itinerary::Coordinate;

    #[derive(Default)]
    struct CountingLookup {
        details: AtomicUsize,
        links: AtomicUsize,
        searches: AtomicUsize,
        fail: bool,
    }

    impl PlaceLookup for CountingLookup {
        async fn place_details(&self, place_id: &str) -> Result<PlaceMatch, LookupError> {
            self.details.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LookupError::NoResult(place_id.to_string()));
            }
            Ok(PlaceMatch {
                place_id: Some(place_id.to_string()),
                name: Some("Tsumago-juku".into()),
                coordinate: Some(Coordinate::new(35.5767, 137.5958)),
                canonical_map_url: Some("https://maps.google.com/?cid=1".into()),
            })
        }

        async fn resolve_map_link(&self, url: &str) -> Result<MapLinkMatch, LookupError> {
            self.links.fetch_add(1, Ordering::SeqCst);
            Ok(MapLinkMatch {
                coordinate: Some(Coordinate::new(35.60, 137.60)),
                place_id: None,
                canonical_map_url: url.to_string(),
            })
        }

        async fn search_text(&self, _query: &str) -> Result<PlaceMatch, LookupError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(PlaceMatch {
                coordinate: None,
                ..PlaceMatch::default()
            })
        }
    }

    #[tokio::test]
    async fn unchanged_row_hits_cache() {
        let resolver = StopResolver::new(CountingLookup::default());
        let row = ItineraryRow::new("r1", 1).with_place_id("ChIJtsumago");

        let first = resolver.resolve_row(&row).await.unwrap();
        let second = resolver.resolve_row(&row).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.key, "pid:ChIJtsumago");
        assert_eq!(resolver.lookup().details.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn place_id_takes_priority_over_map_link() {
        let resolver = StopResolver::new(CountingLookup::default());
        let row = ItineraryRow::new("r1", 1)
            .with_place_id("ChIJtsumago")
            .with_map_url("https://maps.example/abc")
            .with_name("Tsumago");

        let stop = resolver.resolve_row(&row).await.unwrap();

        assert_eq!(stop.place_id.as_deref(), Some("ChIJtsumago"));
        assert_eq!(resolver.lookup().details.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.lookup().links.load(Ordering::SeqCst), 0);
        assert_eq!(resolver.lookup().searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn map_link_keeps_canonical_url() {
        let resolver = StopResolver::new(CountingLookup::default());
        let row = ItineraryRow::new("r1", 1).with_map_url("https://maps.example/abc");

        let stop = resolver.resolve_row(&row).await.unwrap();

        assert_eq!(stop.key, "url:https://maps.example/abc");
        assert_eq!(stop.coordinate, Coordinate::new(35.60, 137.60));
        assert_eq!(stop.canonical_map_url.as_deref(), Some("https://maps.example/abc"));
    }

    #[tokio::test]
    async fn missing_geometry_is_null_and_not_cached() {
        let resolver = StopResolver::new(CountingLookup::default());
        let row = ItineraryRow::new("r1", 1).with_name("Nowhere");

        assert!(resolver.resolve_row(&row).await.is_none());
        assert!(resolver.resolve_row(&row).await.is_none());
        assert_eq!(resolver.lookup().searches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn lookup_error_becomes_none() {
        let lookup = CountingLookup {
            fail: true,
            ..CountingLookup::default()
        };
        let resolver = StopResolver::new(lookup);
        let row = ItineraryRow::new("r1", 1).with_place_id("ChIJbroken");

        assert!(resolver.resolve_row(&row).await.is_none());
    }

    #[tokio::test]
    async fn blank_row_does_no_io() {
        let resolver = StopResolver::new(CountingLookup::default());
        let row = ItineraryRow::new("r1", 1).with_name("  ");

        assert!(resolver.resolve_row(&row).await.is_none());
        let lookup = resolver.lookup();
        let calls = lookup.details.load(Ordering::SeqCst)
            + lookup.links.load(Ordering::SeqCst)
            + lookup.searches.load(Ordering::SeqCst);
        assert_eq!(calls, 0);
    }
}
