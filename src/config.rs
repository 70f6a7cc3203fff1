//! Configuration types for gameshelf.
//!
//! Loaded from `config.toml`; every field has a default so a missing file
//! or a partial file both work.
//!
//! ```toml
//! [search]
//! language = "en"
//! timeout_seconds = 15
//!
//! [store]
//! library_path = "/home/me/games/library.json"
//! ```

use std::path::{Path, PathBuf};

use gameshelf_search::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};
use crate::shelf_dirs;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// Metadata search settings.
    pub search: SearchSection,
    /// Library storage settings.
    pub store: StoreSection,
}

/// `[search]` section, mirrored into [`SearchConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// Wikidata SPARQL endpoint URL.
    pub wikidata_endpoint: String,
    /// MediaWiki action API URL.
    pub wikipedia_api_url: String,
    /// Language code for labels.
    pub language: String,
    /// Maximum number of results per search.
    pub max_results: usize,
    /// Minimum non-whitespace characters in a query.
    pub min_query_chars: usize,
    /// Number of Wikipedia search hits to consider.
    pub wikipedia_search_limit: usize,
    /// Row limit on the Wikidata query.
    pub wikidata_row_limit: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Result cache lifetime in seconds; 0 disables the cache.
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached queries.
    pub cache_capacity: u64,
    /// Custom User-Agent for Wikimedia requests.
    pub user_agent: Option<String>,
}

impl Default for SearchSection {
    fn default() -> Self {
        let defaults = SearchConfig::default();
        Self {
            wikidata_endpoint: defaults.wikidata_endpoint,
            wikipedia_api_url: defaults.wikipedia_api_url,
            language: defaults.language,
            max_results: defaults.max_results,
            min_query_chars: defaults.min_query_chars,
            wikipedia_search_limit: defaults.wikipedia_search_limit,
            wikidata_row_limit: defaults.wikidata_row_limit,
            timeout_seconds: defaults.timeout_seconds,
            cache_ttl_seconds: defaults.cache_ttl_seconds,
            cache_capacity: defaults.cache_capacity,
            user_agent: defaults.user_agent,
        }
    }
}

impl SearchSection {
    /// Convert into the search crate's configuration.
    pub fn to_search_config(&self) -> SearchConfig {
        SearchConfig {
            wikidata_endpoint: self.wikidata_endpoint.clone(),
            wikipedia_api_url: self.wikipedia_api_url.clone(),
            language: self.language.clone(),
            max_results: self.max_results,
            min_query_chars: self.min_query_chars,
            wikipedia_search_limit: self.wikipedia_search_limit,
            wikidata_row_limit: self.wikidata_row_limit,
            timeout_seconds: self.timeout_seconds,
            cache_ttl_seconds: self.cache_ttl_seconds,
            cache_capacity: self.cache_capacity,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Library file. Defaults to [`shelf_dirs::library_path`].
    pub library_path: Option<PathBuf>,
}

impl StoreSection {
    /// The library file to open.
    pub fn resolved_library_path(&self) -> PathBuf {
        self.library_path
            .clone()
            .unwrap_or_else(shelf_dirs::library_path)
    }
}

impl ShelfConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ShelfError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ShelfError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/gameshelf/config.toml`.
    pub fn default_config_path() -> PathBuf {
        shelf_dirs::config_path()
    }

    /// Load from `path` if given, else from the default path if that file
    /// exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_config_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)
                } else {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Check the search settings.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search
            .to_search_config()
            .validate()
            .map_err(|e| ShelfError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ShelfConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.cache_ttl_seconds, 300);
    }

    #[test]
    fn search_section_round_trips_into_search_config() {
        let section = SearchSection {
            language: "de".into(),
            timeout_seconds: 3,
            ..Default::default()
        };
        let search = section.to_search_config();
        assert_eq!(search.language, "de");
        assert_eq!(search.timeout_seconds, 3);
        assert_eq!(search.max_results, SearchConfig::default().max_results);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: ShelfConfig = toml::from_str(
            r#"
            [search]
            timeout_seconds = 20
            "#,
        )
        .expect("parse");
        assert_eq!(config.search.timeout_seconds, 20);
        assert_eq!(config.search.language, "en");
        assert!(config.store.library_path.is_none());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = ShelfConfig::default();
        config.search.max_results = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ShelfError::Config(_)));
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let mut config = ShelfConfig::default();
        config.store.library_path = Some(dir.path().join("library.json"));
        config.search.user_agent = Some("gameshelf-test/1.0".into());

        config.save_to_file(&path).expect("save");
        let loaded = ShelfConfig::from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = ShelfConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(ShelfError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").expect("write");
        assert!(matches!(
            ShelfConfig::from_file(&path),
            Err(ShelfError::Config(_))
        ));
    }

    #[test]
    fn load_with_explicit_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[search]\nlanguage = \"fr\"\n").expect("write");
        let config = ShelfConfig::load(Some(&path)).expect("load");
        assert_eq!(config.search.language, "fr");
    }

    #[test]
    fn resolved_library_path_prefers_explicit() {
        let store = StoreSection {
            library_path: Some(PathBuf::from("/data/games.json")),
        };
        assert_eq!(store.resolved_library_path(), PathBuf::from("/data/games.json"));
        assert!(StoreSection::default()
            .resolved_library_path()
            .ends_with("library.json"));
    }
}
