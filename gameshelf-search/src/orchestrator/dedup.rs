//! Exact-duplicate removal.
//!
//! Two candidates are exact duplicates when they share the lowercased title,
//! the release date, and the same platform set. The first occurrence wins.

use std::collections::HashSet;

use crate::types::Candidate;

/// Identity key used for exact deduplication.
pub fn dedup_key(candidate: &Candidate) -> String {
    let mut platforms: Vec<&str> = candidate.platforms.iter().map(String::as_str).collect();
    platforms.sort_unstable();
    format!(
        "{}|{}|{}",
        candidate.title.to_lowercase(),
        candidate.release_date.as_deref().unwrap_or(""),
        platforms.join(",")
    )
}

/// Remove exact duplicates, keeping the first occurrence and input order.
pub fn deduplicate(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(dedup_key(c)))
        .collect()
}
