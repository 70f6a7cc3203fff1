//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which endpoints are queried, timeouts, caching,
//! and result limits. The defaults point at the public Wikimedia services.

use crate::error::SearchError;

/// Default Wikidata SPARQL endpoint.
pub const WIKIDATA_SPARQL_URL: &str = "https://query.wikidata.org/sparql";

/// Default English Wikipedia action API endpoint.
pub const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

/// Configuration for the search pipeline.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Wikidata SPARQL endpoint URL.
    pub wikidata_endpoint: String,
    /// MediaWiki action API URL.
    pub wikipedia_api_url: String,
    /// Language code for labels and article lookup.
    pub language: String,
    /// Maximum number of results returned after ranking.
    pub max_results: usize,
    /// Queries with fewer non-whitespace characters are rejected.
    pub min_query_chars: usize,
    /// Number of Wikipedia search hits to consider.
    pub wikipedia_search_limit: usize,
    /// Row limit on the Wikidata query.
    pub wikidata_row_limit: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// How long to cache results in seconds. Set to 0 to disable caching.
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached queries.
    pub cache_capacity: u64,
    /// Custom User-Agent string. If `None`, the crate's identifying agent is used.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wikidata_endpoint: WIKIDATA_SPARQL_URL.to_owned(),
            wikipedia_api_url: WIKIPEDIA_API_URL.to_owned(),
            language: "en".to_owned(),
            max_results: 10,
            min_query_chars: 2,
            wikipedia_search_limit: 10,
            wikidata_row_limit: 50,
            timeout_seconds: 10,
            cache_ttl_seconds: 300,
            cache_capacity: 200,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `wikipedia_search_limit` and `wikidata_row_limit` must be greater than 0
    /// - both endpoints must be absolute URLs
    /// - `language` must not be empty
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.wikipedia_search_limit == 0 || self.wikidata_row_limit == 0 {
            return Err(SearchError::Config(
                "source limits must be greater than 0".into(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(SearchError::Config("language must not be empty".into()));
        }
        for (name, endpoint) in [
            ("wikidata_endpoint", &self.wikidata_endpoint),
            ("wikipedia_api_url", &self.wikipedia_api_url),
        ] {
            url::Url::parse(endpoint)
                .map_err(|e| SearchError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.min_query_chars, 2);
        assert_eq!(config.cache_ttl_seconds, 300);
        assert_eq!(config.wikipedia_search_limit, 10);
        assert_eq!(config.language, "en");
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = SearchConfig {
            max_results: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn zero_source_limit_rejected() {
        let config = SearchConfig {
            wikipedia_search_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn relative_endpoint_rejected() {
        let config = SearchConfig {
            wikidata_endpoint: "/sparql".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("wikidata_endpoint"));
    }

    #[test]
    fn empty_language_rejected() {
        let config = SearchConfig {
            language: " ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_cache_ttl_valid() {
        let config = SearchConfig {
            cache_ttl_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
