//! Ranking with tie bands.
//!
//! Candidates are ordered by confidence, then completeness, then source
//! preference (Wikidata before Wikipedia). Confidence and completeness
//! differences of at most [`TIE_BAND`] count as ties.
//!
//! The tie band makes the ordering non-transitive, so a plain comparison
//! sort is not usable. Instead candidates are pre-sorted by confidence and
//! then placed by insertion: each one moves ahead only past neighbours it
//! ranks before. The result satisfies, for every adjacent pair `(a, b)`,
//! `confidence(a) >= confidence(b) - TIE_BAND`.

use crate::types::{Candidate, RankedResult};

use super::dedup::deduplicate;
use super::merge::collapse_similar;
use super::scoring::completeness;

/// Differences up to this size are treated as ties.
pub const TIE_BAND: f64 = 0.1;

/// Default cap on the ranked list.
pub const MAX_RANKED_RESULTS: usize = 10;

/// Absorbs float noise such as `0.8 - 0.7 = 0.10000000000000009`.
const EPSILON: f64 = 1e-9;

/// Whether `a` should be listed before `b`.
pub fn ranks_before(a: &Candidate, b: &Candidate) -> bool {
    let confidence_delta = a.confidence() - b.confidence();
    if confidence_delta.abs() > TIE_BAND + EPSILON {
        return confidence_delta > 0.0;
    }
    let completeness_delta = completeness(a) - completeness(b);
    if completeness_delta.abs() > TIE_BAND + EPSILON {
        return completeness_delta > 0.0;
    }
    a.source().preference() > b.source().preference()
}

/// Order candidates best first.
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.confidence().total_cmp(&a.confidence()));

    let mut ordered: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let mut position = ordered.len();
        while position > 0 && ranks_before(&candidate, &ordered[position - 1]) {
            position -= 1;
        }
        ordered.insert(position, candidate);
    }
    ordered
}

/// Deduplicate, collapse similar candidates, rank, and truncate.
pub fn rank_and_deduplicate(candidates: Vec<Candidate>, max_results: usize) -> Vec<RankedResult> {
    let unique = collapse_similar(deduplicate(candidates));
    let mut ranked = rank(unique);
    ranked.truncate(max_results);
    ranked
}
