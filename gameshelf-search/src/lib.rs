//! # gameshelf-search
//!
//! Game metadata search across Wikidata and Wikipedia.
//!
//! A query goes to Wikidata first. When the structured answer is weak
//! (low confidence or sparse fields) Wikipedia is consulted as well, and
//! candidates describing the same game are merged before ranking.
//!
//! ## Design
//!
//! - Sources implement [`MetadataSource`] and normalize into [`Candidate`]
//! - Confidence and completeness scoring decide whether to fall back
//! - Merge, similarity collapse, exact dedup and banded ranking
//! - Per-orchestrator query cache with a configurable TTL
//! - Failures degrade to fewer results, never to an error for the caller
//!
//! ## Licensing
//!
//! Every candidate carries an [`Attribution`]: Wikidata content is CC0,
//! Wikipedia content is CC BY-SA 3.0.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod source;
pub mod sources;
pub mod types;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use orchestrator::search::{SearchOrchestrator, SearchPath};
pub use source::MetadataSource;
pub use sources::{WikidataSource, WikipediaSource};
pub use types::{Attribution, Candidate, DataCompleteness, RankedResult, Source};

/// Search for games with a one-off orchestrator.
///
/// Convenient for single lookups; callers issuing repeated searches should
/// keep a [`SearchOrchestrator`] so its cache is reused.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid, or
/// [`SearchError::Http`] if the HTTP client cannot be built. Source
/// failures are not errors: they yield fewer or no results.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> gameshelf_search::Result<()> {
/// let config = gameshelf_search::SearchConfig::default();
/// for game in gameshelf_search::search("Celeste", &config).await? {
///     println!("{} ({:?})", game.title, game.release_date);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &SearchConfig) -> Result<Vec<RankedResult>> {
    let orchestrator = SearchOrchestrator::new(config)?;
    Ok(orchestrator.search(query).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_validates_config_zero_max_results() {
        let config = SearchConfig {
            max_results: 0,
            ..Default::default()
        };
        let result = search("Celeste", &config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_results"));
    }

    #[tokio::test]
    async fn search_validates_config_zero_timeout() {
        let config = SearchConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let result = search("Celeste", &config).await;
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn short_query_needs_no_network() {
        let config = SearchConfig {
            wikidata_endpoint: "http://127.0.0.1:9/sparql".into(),
            wikipedia_api_url: "http://127.0.0.1:9/w/api.php".into(),
            ..Default::default()
        };
        let results = search("x", &config).await.expect("valid config");
        assert!(results.is_empty());
    }
}
