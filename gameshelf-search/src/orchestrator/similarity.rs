//! Title normalisation and "same game" detection.
//!
//! Two candidates describe the same game when their titles are equal
//! (trimmed, case-insensitive), when one title contains the other, or when
//! both carry the same release year and share at least one platform.
//!
//! The containment rule is applied regardless of title length, so very short
//! titles ("It", "Go") can over-merge with longer ones ("It Takes Two").

use std::collections::HashSet;

use crate::types::Candidate;

/// How closely two titles match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleMatch {
    /// Equal after normalisation.
    Exact,
    /// One contains the other after normalisation.
    Partial,
    /// Neither.
    None,
}

/// Normalise a title for comparison: trimmed and lowercased.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Compare two titles after normalisation.
///
/// Blank input never matches; otherwise every string would "contain" it.
pub fn title_match(a: &str, b: &str) -> TitleMatch {
    let a = normalize_title(a);
    let b = normalize_title(b);
    if a.is_empty() || b.is_empty() {
        return TitleMatch::None;
    }
    if a == b {
        TitleMatch::Exact
    } else if a.contains(&b) || b.contains(&a) {
        TitleMatch::Partial
    } else {
        TitleMatch::None
    }
}

/// Whether two platform lists share an entry (case-insensitive).
pub fn platforms_overlap(a: &[String], b: &[String]) -> bool {
    let left: HashSet<String> = a.iter().map(|p| normalize_title(p)).collect();
    b.iter().any(|p| left.contains(&normalize_title(p)))
}

/// Whether two candidates describe the same game.
pub fn are_similar(a: &Candidate, b: &Candidate) -> bool {
    if title_match(&a.title, &b.title) != TitleMatch::None {
        return true;
    }
    match (a.release_year(), b.release_year()) {
        (Some(ya), Some(yb)) if ya == yb => platforms_overlap(&a.platforms, &b.platforms),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn game(title: &str, date: Option<&str>, platforms: &[&str]) -> Candidate {
        let mut c = Candidate::new("t", title, Source::Wikidata, "q").expect("title");
        c.release_date = date.map(str::to_owned);
        c.platforms = platforms.iter().map(|p| (*p).to_owned()).collect();
        c
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_title("  DOOM  "), "doom");
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        assert_eq!(title_match("DOOM", "doom "), TitleMatch::Exact);
    }

    #[test]
    fn partial_match_either_direction() {
        assert_eq!(
            title_match("Breath of the Wild", "The Legend of Zelda: Breath of the Wild"),
            TitleMatch::Partial
        );
        assert_eq!(
            title_match("The Legend of Zelda: Breath of the Wild", "breath of the wild"),
            TitleMatch::Partial
        );
    }

    #[test]
    fn unrelated_titles_do_not_match() {
        assert_eq!(title_match("Celeste", "Hollow Knight"), TitleMatch::None);
    }

    #[test]
    fn blank_titles_never_match() {
        assert_eq!(title_match("", "Celeste"), TitleMatch::None);
        assert_eq!(title_match("  ", "  "), TitleMatch::None);
    }

    #[test]
    fn short_title_over_merges() {
        // Known false-merge risk kept for compatibility.
        let a = game("It", None, &[]);
        let b = game("It Takes Two", None, &[]);
        assert!(are_similar(&a, &b));
    }

    #[test]
    fn year_and_platform_overlap_is_similar() {
        let a = game("Doom", Some("1993-12-10"), &["PC"]);
        let b = game("id's shooter", Some("December 1993"), &["pc", "DOS"]);
        assert!(are_similar(&a, &b));
    }

    #[test]
    fn same_year_without_platform_overlap_is_not_similar() {
        let a = game("Doom", Some("1993-12-10"), &["PC"]);
        let b = game("Myst", Some("1993-09-24"), &["Macintosh"]);
        assert!(!are_similar(&a, &b));
    }

    #[test]
    fn platform_overlap_in_different_years_is_not_similar() {
        let a = game("Doom", Some("1993-12-10"), &["PC"]);
        let b = game("Quake", Some("1996-06-22"), &["PC"]);
        assert!(!are_similar(&a, &b));
    }

    #[test]
    fn missing_year_falls_back_to_title_only() {
        let a = game("Doom", None, &["PC"]);
        let b = game("Quake", Some("1996"), &["PC"]);
        assert!(!are_similar(&a, &b));
    }

    #[test]
    fn platforms_overlap_handles_empty() {
        assert!(!platforms_overlap(&[], &["PC".to_owned()]));
        assert!(platforms_overlap(&["Switch".to_owned()], &["switch".to_owned()]));
    }
}
