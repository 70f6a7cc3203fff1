//! In-memory query cache for ranked results.
//!
//! Caches the final ranked results keyed by the trimmed query. Uses
//! [`moka`] for async-friendly caching: entries older than the TTL are
//! never returned and are evicted lazily as the cache is touched.
//!
//! Each [`crate::SearchOrchestrator`] owns its own [`SearchCache`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;

use crate::types::RankedResult;

/// A cached search outcome.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Ranked results as returned to the caller.
    pub results: Vec<RankedResult>,
    /// When the results were cached.
    pub cached_at: DateTime<Utc>,
}

/// Normalise a query into a cache key: surrounding whitespace trimmed.
pub fn cache_key(query: &str) -> String {
    query.trim().to_owned()
}

/// Time-bounded memoization of search results.
#[derive(Clone)]
pub struct SearchCache {
    inner: Option<Cache<String, CacheEntry>>,
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("enabled", &self.inner.is_some())
            .finish()
    }
}

impl SearchCache {
    /// Create a cache holding up to `capacity` queries for `ttl`.
    ///
    /// A zero `ttl` disables caching entirely.
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let inner = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    /// Whether this cache stores anything at all.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Look up cached results for `query`.
    ///
    /// Returns `Some(entry)` on a fresh hit, `None` on miss or expiry.
    pub async fn get(&self, query: &str) -> Option<CacheEntry> {
        let cache = self.inner.as_ref()?;
        cache.get(&cache_key(query)).await
    }

    /// Store results for `query`, replacing any previous entry.
    pub async fn insert(&self, query: &str, results: Vec<RankedResult>) {
        let Some(cache) = self.inner.as_ref() else {
            return;
        };
        let entry = CacheEntry {
            results,
            cached_at: Utc::now(),
        };
        cache.insert(cache_key(query), entry).await;
        cache.run_pending_tasks().await;
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        if let Some(cache) = self.inner.as_ref() {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> u64 {
        match self.inner.as_ref() {
            Some(cache) => {
                cache.run_pending_tasks().await;
                cache.entry_count()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, Source};

    fn results(title: &str) -> Vec<RankedResult> {
        vec![Candidate::new("id", title, Source::Wikidata, title).expect("title")]
    }

    #[test]
    fn cache_key_trims_whitespace() {
        assert_eq!(cache_key("  celeste  "), "celeste");
        assert_eq!(cache_key(""), cache_key("   "));
    }

    #[test]
    fn cache_key_preserves_case() {
        assert_ne!(cache_key("Doom"), cache_key("doom"));
    }

    #[tokio::test]
    async fn cache_miss_returns_none() {
        let cache = SearchCache::new(Duration::from_secs(300), 10);
        assert!(cache.get("nonexistent").await.is_none());
    }

    #[tokio::test]
    async fn insert_and_retrieve() {
        let cache = SearchCache::new(Duration::from_secs(300), 10);
        cache.insert("Celeste", results("Celeste")).await;
        let entry = cache.get("  Celeste ").await.expect("should be cached");
        assert_eq!(entry.results.len(), 1);
        assert_eq!(entry.results[0].title, "Celeste");
    }

    #[tokio::test]
    async fn empty_outcome_is_cached() {
        let cache = SearchCache::new(Duration::from_secs(300), 10);
        cache.insert("nothing here", Vec::new()).await;
        let entry = cache.get("nothing here").await.expect("cached");
        assert!(entry.results.is_empty());
    }

    #[tokio::test]
    async fn overwrite_same_key_updates_value() {
        let cache = SearchCache::new(Duration::from_secs(300), 10);
        cache.insert("doom", results("Old")).await;
        cache.insert("doom", results("New")).await;
        let entry = cache.get("doom").await.expect("cached");
        assert_eq!(entry.results[0].title, "New");
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = SearchCache::new(Duration::from_millis(100), 10);
        cache.insert("doom", results("Doom")).await;
        assert!(cache.get("doom").await.is_some());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(cache.get("doom").await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let cache = SearchCache::new(Duration::from_secs(300), 10);
        cache.insert("a query", results("A")).await;
        cache.insert("b query", results("B")).await;
        assert_eq!(cache.len().await, 2);
        cache.clear().await;
        assert!(cache.get("a query").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cache = SearchCache::new(Duration::ZERO, 10);
        assert!(!cache.is_enabled());
        cache.insert("doom", results("Doom")).await;
        assert!(cache.get("doom").await.is_none());
        assert_eq!(cache.len().await, 0);
    }
}
