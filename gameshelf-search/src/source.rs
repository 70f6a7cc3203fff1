//! Trait definition for pluggable metadata sources.
//!
//! Each knowledge base (Wikidata, Wikipedia) implements [`MetadataSource`]
//! to provide a uniform interface for querying and normalizing results
//! into [`Candidate`] records.

use crate::error::SearchError;
use crate::types::{Candidate, Source};

/// A pluggable metadata source backend.
///
/// Implementors query one external knowledge base and normalize its
/// response. Each source handles its own:
///
/// - query construction and encoding
/// - HTTP request with appropriate headers
/// - response normalization into [`Candidate`] values
/// - field-level recovery from malformed upstream data
///
/// Sources recover from their own failures: an unreachable service or an
/// empty answer is logged and reported as `Ok(vec![])`. An `Err` means an
/// unexpected failure, which the orchestrator treats as "source down" and
/// routes around.
///
/// All implementations must be `Send + Sync` so one orchestrator can serve
/// overlapping searches.
pub trait MetadataSource: Send + Sync {
    /// Look up games matching `title`.
    fn fetch(
        &self,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Candidate>, SearchError>> + Send;

    /// Returns which [`Source`] variant this implementation represents.
    fn source_type(&self) -> Source;
}
