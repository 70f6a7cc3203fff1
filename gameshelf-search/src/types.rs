//! Core types: metadata sources, candidates and their provenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Upstream knowledge bases gameshelf-search can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Wikidata SPARQL endpoint. Structured; the primary source.
    Wikidata,
    /// Wikipedia article search plus infobox parsing. The fallback source.
    Wikipedia,
}

impl Source {
    /// Returns the human-readable name of this source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wikidata => "Wikidata",
            Self::Wikipedia => "Wikipedia",
        }
    }

    /// Returns the lowercase identifier used in serialized provenance.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Wikidata => "wikidata",
            Self::Wikipedia => "wikipedia",
        }
    }

    /// Tie-break preference in ranking. Higher ranks first.
    pub fn preference(&self) -> u8 {
        match self {
            Self::Wikidata => 2,
            Self::Wikipedia => 1,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Licensing and provenance details for reused content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    /// Name of the source, e.g. `"Wikipedia"`.
    pub source: String,
    /// License short name, e.g. `"CC BY-SA 3.0"`.
    pub license: String,
    /// Link to the license text.
    pub license_url: Option<String>,
    /// Link to the source document.
    pub url: Option<String>,
    /// Title of the source document.
    pub title: Option<String>,
}

impl Attribution {
    /// Attribution for a Wikipedia article. Always CC BY-SA 3.0.
    pub fn wikipedia(title: &str, url: Option<String>) -> Self {
        Self {
            source: Source::Wikipedia.name().to_owned(),
            license: "CC BY-SA 3.0".to_owned(),
            license_url: Some("https://creativecommons.org/licenses/by-sa/3.0/".to_owned()),
            url,
            title: Some(title.to_owned()),
        }
    }

    /// Attribution for a Wikidata item. Wikidata data is CC0.
    pub fn wikidata(entity_id: &str) -> Self {
        Self {
            source: Source::Wikidata.name().to_owned(),
            license: "CC0 1.0".to_owned(),
            license_url: Some("https://creativecommons.org/publicdomain/zero/1.0/".to_owned()),
            url: Some(format!("https://www.wikidata.org/wiki/{entity_id}")),
            title: Some(entity_id.to_owned()),
        }
    }
}

/// A secondary source whose data was folded into a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackSource {
    /// Which source contributed.
    pub source: Source,
    /// Its attribution, if any.
    pub attribution: Option<Attribution>,
}

/// Where a candidate's data came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// The source that produced the record.
    pub primary: Source,
    /// A source that enhanced it during reconciliation.
    pub fallback: Option<FallbackSource>,
}

/// Per-search provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    /// Source that produced the candidate.
    pub source: Source,
    /// The original search term.
    pub query: String,
    /// When the candidate was produced.
    pub timestamp: DateTime<Utc>,
    /// Relevance confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Field-presence summary attached by the sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCompleteness {
    /// Fraction of the completeness checklist that is populated.
    pub score: f64,
    /// Names of checklist fields that are missing.
    pub missing_fields: Vec<String>,
    /// Whether another source should be consulted to fill gaps.
    pub fallback_needed: bool,
}

/// One source's proposed metadata record for a query, pre-merge.
///
/// `title` is never empty: [`Candidate::new`] refuses blank titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Source-scoped opaque identifier.
    pub id: String,
    /// Native identifier in the source (Q-number, page title).
    pub source_id: Option<String>,
    /// Game title.
    pub title: String,
    /// Platforms, in first-seen order without duplicates.
    pub platforms: Vec<String>,
    /// ISO-8601 date when parseable, otherwise the raw upstream value.
    pub release_date: Option<String>,
    /// Primary developer.
    pub developer: Option<String>,
    /// Primary publisher.
    pub publisher: Option<String>,
    /// Every developer the source listed.
    pub developers: Vec<String>,
    /// Every publisher the source listed.
    pub publishers: Vec<String>,
    /// Genres.
    pub genre: Vec<String>,
    /// Full-size cover image URL.
    pub cover_image: Option<String>,
    /// Thumbnail URL derived from the cover image.
    pub thumbnail: Option<String>,
    /// Plain-text description.
    pub description: Option<String>,
    /// Official website URL.
    pub official_website: Option<String>,
    /// Store name → URL.
    pub official_store_links: BTreeMap<String, String>,
    /// Franchise or series.
    pub series: Option<String>,
    /// Game modes (single-player, multiplayer, ...).
    pub modes: Vec<String>,
    /// Per-search provenance.
    pub search_metadata: SearchMetadata,
    /// Primary and fallback sources.
    pub data_source: DataSource,
    /// Licensing of reused content.
    pub attribution: Option<Attribution>,
    /// Set when a Wikipedia candidate enhanced this one.
    pub enhanced_with_wikipedia: bool,
    /// Field-presence summary.
    pub data_completeness: DataCompleteness,
}

/// A candidate after merge, deduplication and ordering.
pub type RankedResult = Candidate;

impl Candidate {
    /// Create a candidate with only identity and provenance filled in.
    ///
    /// Returns `None` when `title` is blank after trimming.
    pub fn new(id: impl Into<String>, title: &str, source: Source, query: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            id: id.into(),
            source_id: None,
            title: title.to_owned(),
            platforms: Vec::new(),
            release_date: None,
            developer: None,
            publisher: None,
            developers: Vec::new(),
            publishers: Vec::new(),
            genre: Vec::new(),
            cover_image: None,
            thumbnail: None,
            description: None,
            official_website: None,
            official_store_links: BTreeMap::new(),
            series: None,
            modes: Vec::new(),
            search_metadata: SearchMetadata {
                source,
                query: query.to_owned(),
                timestamp: Utc::now(),
                confidence: 0.0,
            },
            data_source: DataSource {
                primary: source,
                fallback: None,
            },
            attribution: None,
            enhanced_with_wikipedia: false,
            data_completeness: DataCompleteness::default(),
        })
    }

    /// The source that produced this candidate.
    pub fn source(&self) -> Source {
        self.search_metadata.source
    }

    /// Current confidence score.
    pub fn confidence(&self) -> f64 {
        self.search_metadata.confidence
    }

    /// Year of release, taken from the first four-digit run in
    /// `release_date`.
    pub fn release_year(&self) -> Option<i32> {
        let date = self.release_date.as_deref()?;
        let bytes = date.as_bytes();
        let mut run = 0usize;
        for (i, b) in bytes.iter().enumerate() {
            if b.is_ascii_digit() {
                run += 1;
                let next_is_digit = bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                if run == 4 && !next_is_digit {
                    return date[i + 1 - 4..=i].parse().ok();
                }
            } else {
                run = 0;
            }
        }
        None
    }
}
