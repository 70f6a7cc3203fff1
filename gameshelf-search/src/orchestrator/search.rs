//! Core search orchestrator: tiered source strategy, merge, rank, cache.
//!
//! Per call the orchestrator walks this state machine:
//!
//! ```text
//! Idle ─► PrimaryQuery ─┬─ good quality ──────────────────────► Cache & Return
//!                       ├─ insufficient ─► FallbackQuery ─► Merge ─► Cache & Return
//!                       └─ failed ───────► FallbackQuery (sole source) ─► Cache & Return
//!                                              └─ failed ─► Return empty
//! ```

use std::time::Duration;

use crate::cache::SearchCache;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::source::MetadataSource;
use crate::sources::{WikidataSource, WikipediaSource};
use crate::types::{Candidate, RankedResult};

use super::merge::merge;
use super::ranking::rank_and_deduplicate;
use super::scoring::{is_good_quality, score_candidates};

/// Which branch of the tiered strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPath {
    /// Answered from the cache without any source call.
    Cached,
    /// Primary results were good enough on their own.
    PrimaryOnly,
    /// Primary results were enriched with the fallback source.
    Merged,
    /// The primary source failed; the fallback answered alone.
    FallbackOnly,
    /// Both sources failed.
    BothFailed,
    /// The query was too short to search.
    Rejected,
}

impl SearchPath {
    fn name(&self) -> &'static str {
        match self {
            Self::Cached => "cached",
            Self::PrimaryOnly => "primary_only",
            Self::Merged => "merged",
            Self::FallbackOnly => "fallback_only",
            Self::BothFailed => "both_failed",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for SearchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Drives the primary → fallback → merge → cache strategy.
///
/// Owns its [`SearchCache`]. Safe to share across tasks; overlapping
/// searches only meet at the cache write.
#[derive(Debug)]
pub struct SearchOrchestrator<P = WikidataSource, F = WikipediaSource> {
    primary: P,
    fallback: F,
    cache: SearchCache,
    max_results: usize,
    min_query_chars: usize,
}

impl SearchOrchestrator {
    /// Build an orchestrator over the live Wikidata and Wikipedia sources.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid configuration, or
    /// [`SearchError::Http`] if an HTTP client cannot be constructed.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let primary = WikidataSource::new(config)?;
        let fallback = WikipediaSource::new(config)?;
        Ok(Self::with_sources(primary, fallback, config))
    }
}

impl<P: MetadataSource, F: MetadataSource> SearchOrchestrator<P, F> {
    /// Build an orchestrator over arbitrary sources.
    pub fn with_sources(primary: P, fallback: F, config: &SearchConfig) -> Self {
        let cache = SearchCache::new(
            Duration::from_secs(config.cache_ttl_seconds),
            config.cache_capacity,
        );
        tracing::debug!(
            primary = %primary.source_type(),
            fallback = %fallback.source_type(),
            cache_enabled = cache.is_enabled(),
            "search orchestrator ready"
        );
        Self {
            primary,
            fallback,
            cache,
            max_results: config.max_results,
            min_query_chars: config.min_query_chars,
        }
    }

    /// The primary source.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// The fallback source.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Search for games matching `query`.
    ///
    /// Never fails: every error is logged and the worst outcome is an
    /// empty list. Queries with fewer than `min_query_chars` non-whitespace
    /// characters return an empty list without touching any source.
    pub async fn search(&self, query: &str) -> Vec<RankedResult> {
        let non_whitespace = query.chars().filter(|c| !c.is_whitespace()).count();
        if non_whitespace < self.min_query_chars {
            tracing::trace!(path = %SearchPath::Rejected, "query too short");
            return Vec::new();
        }

        let query = query.trim();
        if let Some(entry) = self.cache.get(query).await {
            tracing::debug!(
                path = %SearchPath::Cached,
                count = entry.results.len(),
                cached_at = %entry.cached_at,
                "search served from cache"
            );
            return entry.results;
        }

        tracing::trace!(query, "search cache miss");
        let (results, path) = self.run_tiers(query).await;
        tracing::debug!(path = %path, count = results.len(), "search finished");

        if path != SearchPath::BothFailed {
            self.cache.insert(query, results.clone()).await;
        }
        results
    }

    /// Drop every cached query.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Number of cached queries.
    pub async fn cache_len(&self) -> u64 {
        self.cache.len().await
    }

    async fn run_tiers(&self, query: &str) -> (Vec<RankedResult>, SearchPath) {
        let primary = match self.primary.fetch(query).await {
            Ok(candidates) => score_candidates(candidates, query),
            Err(err) => {
                tracing::warn!(
                    source = %self.primary.source_type(),
                    error = %err,
                    "primary source failed, trying fallback alone"
                );
                return match self.fetch_fallback(query).await {
                    Some(fallback) => (
                        rank_and_deduplicate(fallback, self.max_results),
                        SearchPath::FallbackOnly,
                    ),
                    None => (Vec::new(), SearchPath::BothFailed),
                };
            }
        };

        if is_good_quality(&primary) {
            return (
                rank_and_deduplicate(primary, self.max_results),
                SearchPath::PrimaryOnly,
            );
        }

        match self.fetch_fallback(query).await {
            Some(fallback) => (
                rank_and_deduplicate(merge(primary, fallback), self.max_results),
                SearchPath::Merged,
            ),
            None => (
                rank_and_deduplicate(primary, self.max_results),
                SearchPath::PrimaryOnly,
            ),
        }
    }

    async fn fetch_fallback(&self, query: &str) -> Option<Vec<Candidate>> {
        match self.fallback.fetch(query).await {
            Ok(candidates) => Some(score_candidates(candidates, query)),
            Err(err) => {
                tracing::warn!(
                    source = %self.fallback.source_type(),
                    error = %err,
                    "fallback source failed"
                );
                None
            }
        }
    }
}
