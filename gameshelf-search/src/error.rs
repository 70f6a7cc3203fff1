//! Error types for the gameshelf-search crate.
//!
//! None of these reach the caller of [`crate::SearchOrchestrator::search`];
//! they exist so sources and the orchestrator can log precise causes and
//! decide between "try the fallback" and "give up".

/// Errors that can occur while querying a metadata source.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Transport failure or non-success status from a metadata source.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The source answered but nothing relevant was found.
    #[error("no match: {0}")]
    NoMatch(String),

    /// A required structure in the upstream response could not be read.
    #[error("malformed upstream data: {0}")]
    MalformedData(String),

    /// The HTTP client could not be constructed or a URL could not be built.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Whether this error means "the source had nothing for us" rather than
    /// a programming or configuration problem.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable(_) | Self::NoMatch(_) | Self::MalformedData(_)
        )
    }
}

/// Convenience type alias for gameshelf-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
