//! Session cache of resolved stops.
//!
//! Three independent tables keyed by place id, map link and search query.
//! Entries are written once per key and never expire: the cache is bounded
//! by what the user has typed into one itinerary.
//!
//! Concurrent misses on the same key are not coalesced. Both resolvers run,
//! the last insert wins, and each caller still gets its own result.

use std::future::Future;
use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::itinerary::{LookupKey, ResolvedStop};

type StopTable = MokaCache<String, Arc<ResolvedStop>>;

/// Read-through cache for stop resolutions.
#[derive(Clone)]
pub struct ResolutionCache {
    by_place_id: StopTable,
    by_map_url: StopTable,
    by_query: StopTable,
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            by_place_id: MokaCache::builder().build(),
            by_map_url: MokaCache::builder().build(),
            by_query: MokaCache::builder().build(),
        }
    }

    fn table(&self, key: &LookupKey) -> &StopTable {
        match key {
            LookupKey::PlaceId(_) => &self.by_place_id,
            LookupKey::MapUrl(_) => &self.by_map_url,
            LookupKey::Query(_) => &self.by_query,
        }
    }

    /// Returns a cached stop without invoking any resolver.
    pub async fn get(&self, key: &LookupKey) -> Option<Arc<ResolvedStop>> {
        self.table(key).get(&key.cache_key()).await
    }

    /// Returns the cached stop for `key`, or runs `resolve` once and caches
    /// its result if it produced one.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        key: &LookupKey,
        resolve: F,
    ) -> Option<Arc<ResolvedStop>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<ResolvedStop>>,
    {
        let cache_key = key.cache_key();
        let table = self.table(key);

        if let Some(hit) = table.get(&cache_key).await {
            debug!(key = %cache_key, "stop cache hit");
            return Some(hit);
        }

        let stop = Arc::new(resolve().await?);
        table.insert(cache_key, stop.clone()).await;
        Some(stop)
    }

    /// Approximate number of cached stops across all tables.
    pub fn entry_count(&self) -> u64 {
        self.by_place_id.entry_count() + self.by_map_url.entry_count() + self.by_query.entry_count()
    }

    /// Drops every cached stop (e.g. when a different itinerary is opened).
    pub fn clear(&self) {
        self.by_place_id.invalidate_all();
        self.by_map_url.invalidate_all();
        self.by_query.invalidate_all();
    }
}
