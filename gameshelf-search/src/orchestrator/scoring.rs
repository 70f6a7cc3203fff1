//! Confidence and completeness scoring for candidates.
//!
//! Completeness is the populated fraction of a fixed eight-field checklist.
//! Confidence blends title match strength, completeness, and source-specific
//! signals:
//!
//! ```text
//! wikidata  = title(0.5 exact | 0.3 partial) + completeness * 0.3
//!           + 0.2 if the Q-number is present
//! wikipedia = title(0.4 exact | 0.25 partial) + completeness * 0.25
//!           + 0.15 if an attribution link is present
//!           + 0.2 if the description is longer than 50 characters
//! ```
//!
//! Both are capped at 1.0.

use crate::types::{Candidate, DataCompleteness, Source};

use super::similarity::{title_match, TitleMatch};

/// Confidence above which a candidate counts as a strong match.
pub const GOOD_CONFIDENCE: f64 = 0.7;

/// Completeness above which a candidate counts as well populated.
pub const GOOD_COMPLETENESS: f64 = 0.5;

/// Description length that earns the Wikipedia description bonus.
const RICH_DESCRIPTION_CHARS: usize = 50;

/// Names of the checklist fields, in checklist order.
pub const COMPLETENESS_FIELDS: [&str; 8] = [
    "title",
    "releaseDate",
    "developer",
    "publisher",
    "platforms",
    "genre",
    "coverImage",
    "description",
];

fn present(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Presence flags for each checklist field, in [`COMPLETENESS_FIELDS`] order.
fn checklist(candidate: &Candidate) -> [bool; 8] {
    [
        !candidate.title.trim().is_empty(),
        present(candidate.release_date.as_ref()),
        present(candidate.developer.as_ref()),
        present(candidate.publisher.as_ref()),
        !candidate.platforms.is_empty(),
        !candidate.genre.is_empty(),
        present(candidate.cover_image.as_ref()),
        present(candidate.description.as_ref()),
    ]
}

/// Fraction of the checklist that is populated, in `[0, 1]`.
pub fn completeness(candidate: &Candidate) -> f64 {
    let flags = checklist(candidate);
    let filled = flags.iter().filter(|f| **f).count();
    filled as f64 / flags.len() as f64
}

/// Build the [`DataCompleteness`] summary a source attaches to a candidate.
///
/// Another source is worth consulting when less than half the checklist is
/// populated or there is no description to show.
pub fn assess_completeness(candidate: &Candidate) -> DataCompleteness {
    let flags = checklist(candidate);
    let missing_fields: Vec<String> = COMPLETENESS_FIELDS
        .iter()
        .zip(flags)
        .filter(|(_, has)| !has)
        .map(|(name, _)| (*name).to_owned())
        .collect();
    let score = completeness(candidate);
    let fallback_needed = score < GOOD_COMPLETENESS || !present(candidate.description.as_ref());
    DataCompleteness {
        score,
        missing_fields,
        fallback_needed,
    }
}

/// Confidence for a candidate produced by Wikidata.
pub fn wikidata_confidence(candidate: &Candidate, query: &str) -> f64 {
    let title = match title_match(&candidate.title, query) {
        TitleMatch::Exact => 0.5,
        TitleMatch::Partial => 0.3,
        TitleMatch::None => 0.0,
    };
    let id_bonus = if present(candidate.source_id.as_ref()) {
        0.2
    } else {
        0.0
    };
    (title + completeness(candidate) * 0.3 + id_bonus).min(1.0)
}

/// Confidence for a candidate produced by Wikipedia.
pub fn wikipedia_confidence(candidate: &Candidate, query: &str) -> f64 {
    let title = match title_match(&candidate.title, query) {
        TitleMatch::Exact => 0.4,
        TitleMatch::Partial => 0.25,
        TitleMatch::None => 0.0,
    };
    let attribution_bonus = if candidate
        .attribution
        .as_ref()
        .is_some_and(|a| present(a.url.as_ref()))
    {
        0.15
    } else {
        0.0
    };
    let description_bonus = if candidate
        .description
        .as_ref()
        .is_some_and(|d| d.chars().count() > RICH_DESCRIPTION_CHARS)
    {
        0.2
    } else {
        0.0
    };
    (title + completeness(candidate) * 0.25 + attribution_bonus + description_bonus).min(1.0)
}

/// Score a candidate against the query using its source's formula.
pub fn score(candidate: &Candidate, query: &str) -> f64 {
    match candidate.source() {
        Source::Wikidata => wikidata_confidence(candidate, query),
        Source::Wikipedia => wikipedia_confidence(candidate, query),
    }
}

/// Apply confidence scores to a list of candidates from one source.
///
/// Returns a new vector with `search_metadata.confidence` updated.
pub fn score_candidates(mut candidates: Vec<Candidate>, query: &str) -> Vec<Candidate> {
    for candidate in &mut candidates {
        candidate.search_metadata.confidence = score(candidate, query);
    }
    candidates
}

/// Whether at least one candidate is both a confident and a complete match.
pub fn is_good_quality(candidates: &[Candidate]) -> bool {
    candidates
        .iter()
        .any(|c| c.confidence() > GOOD_CONFIDENCE && completeness(c) > GOOD_COMPLETENESS)
}
