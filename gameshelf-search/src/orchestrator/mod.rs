//! Search orchestrator: tiered source queries, scoring, merge, ranking.
//!
//! This module queries the primary source, falls back to the secondary
//! source when the primary answer is weak, merges same-game candidates
//! across sources, deduplicates, ranks with tie bands, and caches the
//! final list.

pub mod dedup;
pub mod merge;
pub mod ranking;
pub mod scoring;
pub mod search;
pub mod similarity;
