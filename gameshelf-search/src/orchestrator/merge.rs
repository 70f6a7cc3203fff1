//! Cross-source merging and enhancement.
//!
//! When a secondary-source candidate describes the same game as a primary
//! one (see [`super::similarity::are_similar`]), the primary is enhanced
//! with whatever the secondary uniquely has and the secondary is dropped.
//! Unrelated secondary candidates are appended as independent results.
//! [`collapse_similar`] applies the same rule to a whole list before ranking.

use crate::types::{Candidate, FallbackSource, Source};

use super::scoring::assess_completeness;
use super::similarity::{are_similar, normalize_title};

fn is_blank(value: Option<&String>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn fill(target: &mut Option<String>, other: &Option<String>) {
    if is_blank(target.as_ref()) && !is_blank(other.as_ref()) {
        target.clone_from(other);
    }
}

/// Append entries of `other` missing from `target`, case-insensitively.
fn union(target: &mut Vec<String>, other: &[String]) {
    for value in other {
        let key = normalize_title(value);
        if !target.iter().any(|v| normalize_title(v) == key) {
            target.push(value.clone());
        }
    }
}

/// Fold `secondary`'s data into `primary`.
///
/// Missing scalar fields are filled, list fields gain the entries only the
/// secondary had, and store links the secondary knows about are added.
/// When the two come from different sources, the secondary's attribution is
/// recorded as the fallback source. Confidence and identity stay those of
/// `primary`.
pub fn enhance(primary: &mut Candidate, secondary: &Candidate) {
    fill(&mut primary.description, &secondary.description);
    fill(&mut primary.release_date, &secondary.release_date);
    fill(&mut primary.developer, &secondary.developer);
    fill(&mut primary.publisher, &secondary.publisher);
    fill(&mut primary.cover_image, &secondary.cover_image);
    fill(&mut primary.thumbnail, &secondary.thumbnail);
    fill(&mut primary.official_website, &secondary.official_website);
    fill(&mut primary.series, &secondary.series);

    union(&mut primary.platforms, &secondary.platforms);
    union(&mut primary.genre, &secondary.genre);
    union(&mut primary.modes, &secondary.modes);
    union(&mut primary.developers, &secondary.developers);
    union(&mut primary.publishers, &secondary.publishers);

    for (store, link) in &secondary.official_store_links {
        primary
            .official_store_links
            .entry(store.clone())
            .or_insert_with(|| link.clone());
    }

    if secondary.source() != primary.source() {
        primary.data_source.fallback = Some(FallbackSource {
            source: secondary.source(),
            attribution: secondary.attribution.clone(),
        });
        if secondary.source() == Source::Wikipedia {
            primary.enhanced_with_wikipedia = true;
        }
    }
    primary.data_completeness = assess_completeness(primary);
}

/// Merge primary and secondary candidate sets.
///
/// Output keeps every primary candidate (possibly enhanced) in order,
/// followed by the secondary candidates that matched no primary one.
/// The result is unranked.
pub fn merge(primary: Vec<Candidate>, secondary: Vec<Candidate>) -> Vec<Candidate> {
    let primary_len = primary.len();
    let mut merged = primary;

    for candidate in secondary {
        match merged[..primary_len]
            .iter_mut()
            .find(|p| are_similar(p, &candidate))
        {
            Some(target) => {
                tracing::debug!(
                    primary = %target.title,
                    secondary = %candidate.title,
                    "enhancing primary candidate with secondary data"
                );
                enhance(target, &candidate);
            }
            None => merged.push(candidate),
        }
    }

    merged
}

/// Collapse every pair of similar candidates, whatever their source.
///
/// Candidates are visited in order; the first one seen survives and later
/// similar candidates enhance it. Enhancement can add a release date or
/// platforms, so a survivor is re-checked against the others kept so far
/// and absorbs any that have become similar. No two entries of the output
/// satisfy [`are_similar`].
pub fn collapse_similar(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match kept.iter().position(|k| are_similar(k, &candidate)) {
            Some(index) => {
                tracing::debug!(
                    kept = %kept[index].title,
                    dropped = %candidate.title,
                    "collapsing similar candidate"
                );
                enhance(&mut kept[index], &candidate);
                absorb_newly_similar(&mut kept, index);
            }
            None => kept.push(candidate),
        }
    }

    kept
}

/// Fold into `kept[index]` (or into an earlier entry) every other kept
/// candidate it now matches. The lower index always survives.
fn absorb_newly_similar(kept: &mut Vec<Candidate>, mut index: usize) {
    while let Some(other) =
        (0..kept.len()).find(|&j| j != index && are_similar(&kept[index], &kept[j]))
    {
        let (winner, loser) = if other < index {
            (other, index)
        } else {
            (index, other)
        };
        let removed = kept.remove(loser);
        enhance(&mut kept[winner], &removed);
        index = winner;
    }
}
