//! Wikipedia source: article search plus infobox parsing.
//!
//! Searches for `"<title> video game"`, picks the most game-like hit,
//! then reads the article's lead extract, lead image, canonical URL and
//! raw wikitext. The infobox supplies the structured fields.

use scraper::Html;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::orchestrator::scoring::assess_completeness;
use crate::source::MetadataSource;
use crate::types::{Attribution, Candidate, Source};

use super::images::{thumbnail_url, validate_image_url, THUMBNAIL_WIDTH};
use super::infobox::{parse_infobox, Infobox};

/// Snippet words that suggest an article is about a game.
const GAME_KEYWORDS: &[&str] = &[
    "video game",
    "game",
    "developed",
    "published",
    "platform",
    "console",
];

const EXACT_TITLE_SCORE: u32 = 100;
const PARTIAL_TITLE_SCORE: u32 = 50;
const KEYWORD_SCORE: u32 = 10;

/// Metadata source backed by the MediaWiki action API.
#[derive(Debug, Clone)]
pub struct WikipediaSource {
    client: reqwest::Client,
    api_url: String,
    search_limit: usize,
}

impl WikipediaSource {
    /// Create a source using the API URL and limits from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            api_url: config.wikipedia_api_url.clone(),
            search_limit: config.wikipedia_search_limit,
        })
    }

    async fn best_hit(&self, title: &str) -> Result<SearchHit, SearchError> {
        let search = format!("{} video game", title.trim());
        let limit = self.search_limit.to_string();
        let body = http::get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", search.as_str()),
                ("srnamespace", "0"),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ],
            "Wikipedia search",
        )
        .await?;

        let response: ApiResponse<SearchQuery> = decode(body, "Wikipedia search")?;
        pick_best_hit(response.query.search, title)
            .ok_or_else(|| SearchError::NoMatch(format!("no Wikipedia article for '{title}'")))
    }

    async fn page_info(&self, page_title: &str) -> Result<PageInfo, SearchError> {
        let thumb_size = THUMBNAIL_WIDTH.to_string();
        let body = http::get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query"),
                ("prop", "extracts|pageimages|info"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("inprop", "url"),
                ("piprop", "original|thumbnail"),
                ("pithumbsize", thumb_size.as_str()),
                ("redirects", "1"),
                ("titles", page_title),
                ("format", "json"),
                ("formatversion", "2"),
            ],
            "Wikipedia page",
        )
        .await?;

        let response: ApiResponse<PagesQuery<PageInfo>> = decode(body, "Wikipedia page")?;
        response
            .query
            .pages
            .into_iter()
            .find(|p| !p.missing)
            .ok_or_else(|| SearchError::NoMatch(format!("page '{page_title}' is missing")))
    }

    async fn wikitext(&self, page_title: &str) -> Result<String, SearchError> {
        let body = http::get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("redirects", "1"),
                ("titles", page_title),
                ("format", "json"),
                ("formatversion", "2"),
            ],
            "Wikipedia wikitext",
        )
        .await?;

        let response: ApiResponse<PagesQuery<RevisionPage>> = decode(body, "Wikipedia wikitext")?;
        response
            .query
            .pages
            .into_iter()
            .flat_map(|p| p.revisions)
            .map(|r| r.slots.main.content)
            .next()
            .ok_or_else(|| SearchError::MalformedData(format!("no wikitext for '{page_title}'")))
    }

    async fn lookup(&self, title: &str) -> Result<Candidate, SearchError> {
        let hit = self.best_hit(title).await?;
        tracing::trace!(page = %hit.title, pageid = hit.pageid, "Wikipedia article chosen");

        let (page, wikitext) = tokio::join!(self.page_info(&hit.title), self.wikitext(&hit.title));
        let page = page?;
        let infobox = parse_infobox(&wikitext?).ok_or_else(|| {
            SearchError::NoMatch(format!("no usable infobox in '{}'", page.title))
        })?;

        build_candidate(page, infobox, &self.api_url, title)
            .ok_or_else(|| SearchError::MalformedData("article has no usable title".into()))
    }
}

impl MetadataSource for WikipediaSource {
    async fn fetch(&self, title: &str) -> Result<Vec<Candidate>, SearchError> {
        tracing::trace!(title, "Wikipedia search");
        match self.lookup(title).await {
            Ok(candidate) => Ok(vec![candidate]),
            Err(SearchError::NoMatch(reason)) => {
                tracing::debug!(reason = %reason, "Wikipedia has no match");
                Ok(Vec::new())
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "Wikipedia lookup failed");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    fn source_type(&self) -> Source {
        Source::Wikipedia
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<Q> {
    query: Q,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

/// One `list=search` hit.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub pageid: u64,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery<P> {
    #[serde(default = "Vec::new")]
    pages: Vec<P>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    source: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    #[serde(default)]
    pageid: u64,
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    original: Option<ImageRef>,
    #[serde(default)]
    thumbnail: Option<ImageRef>,
    #[serde(default)]
    fullurl: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevisionPage {
    #[serde(default)]
    revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: Slots,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: Slot,
}

#[derive(Debug, Deserialize)]
struct Slot {
    content: String,
}

fn decode<T: serde::de::DeserializeOwned>(body: Value, label: &str) -> Result<T, SearchError> {
    if let Some(error) = body.get("error") {
        return Err(SearchError::MalformedData(format!("{label} API error: {error}")));
    }
    serde_json::from_value(body).map_err(|e| SearchError::MalformedData(format!("{label}: {e}")))
}

/// Plain text of a search snippet, which carries `<span>` highlight markup.
pub fn strip_html(snippet: &str) -> String {
    Html::parse_fragment(snippet)
        .root_element()
        .text()
        .collect::<String>()
}

/// Article title without a trailing game disambiguator, e.g.
/// `Celeste (video game)` → `Celeste`.
pub fn strip_disambiguation(title: &str) -> &str {
    let title = title.trim();
    if let Some(open) = title.rfind(" (") {
        let inner = &title[open + 2..];
        if inner.ends_with(')') && inner.to_lowercase().trim_end_matches(')').ends_with("game") {
            return title[..open].trim_end();
        }
    }
    title
}

/// Score a search hit against the searched title.
///
/// +100 when the title (with or without its disambiguator) equals the
/// query, otherwise +50 when either contains the other; +10 for each game
/// keyword found in the snippet.
pub fn score_hit(hit_title: &str, snippet: &str, query: &str) -> u32 {
    let query = query.trim().to_lowercase();
    let title = hit_title.trim().to_lowercase();
    let bare = strip_disambiguation(&title);

    let mut score = 0;
    if !query.is_empty() {
        if title == query || bare == query {
            score += EXACT_TITLE_SCORE;
        } else if title.contains(&query) || (!bare.is_empty() && query.contains(bare)) {
            score += PARTIAL_TITLE_SCORE;
        }
    }

    let text = strip_html(snippet).to_lowercase();
    let keywords = GAME_KEYWORDS.iter().filter(|k| text.contains(*k)).count() as u32;
    score + keywords * KEYWORD_SCORE
}

/// Highest-scoring hit; earlier hits win ties. `None` when every hit
/// scores zero.
pub(crate) fn pick_best_hit(hits: Vec<SearchHit>, query: &str) -> Option<SearchHit> {
    let mut best: Option<(u32, SearchHit)> = None;
    for hit in hits {
        let score = score_hit(&hit.title, &hit.snippet, query);
        tracing::trace!(title = %hit.title, score, "Wikipedia hit scored");
        if score > 0 && best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, hit));
        }
    }
    best.map(|(_, hit)| hit)
}

fn article_url(api_url: &str, page_title: &str) -> Option<String> {
    let base = url::Url::parse(api_url).ok()?;
    base.join(&format!("/wiki/{}", page_title.replace(' ', "_")))
        .ok()
        .map(|u| u.to_string())
}

/// Assemble a candidate from the article page and its infobox.
pub(crate) fn build_candidate(
    page: PageInfo,
    infobox: Infobox,
    api_url: &str,
    query: &str,
) -> Option<Candidate> {
    let title = infobox
        .title
        .unwrap_or_else(|| strip_disambiguation(&page.title).to_owned());
    let mut candidate = Candidate::new(
        format!("wikipedia-{}", page.pageid),
        &title,
        Source::Wikipedia,
        query,
    )?;

    candidate.source_id = Some(page.title.clone());
    candidate.description = page
        .extract
        .map(|e| e.trim().to_owned())
        .filter(|e| !e.is_empty());
    candidate.release_date = infobox.release_date;
    candidate.developer = infobox.developers.first().cloned();
    candidate.publisher = infobox.publishers.first().cloned();
    candidate.developers = infobox.developers;
    candidate.publishers = infobox.publishers;
    candidate.platforms = infobox.platforms;
    candidate.genre = infobox.genres;
    candidate.modes = infobox.modes;
    candidate.series = infobox.series;

    let thumbnail = page.thumbnail.and_then(|t| validate_image_url(&t.source));
    candidate.cover_image = page
        .original
        .and_then(|o| validate_image_url(&o.source))
        .or_else(|| thumbnail.clone());
    candidate.thumbnail = thumbnail.or_else(|| candidate.cover_image.as_deref().and_then(thumbnail_url));

    let url = page.fullurl.or_else(|| article_url(api_url, &page.title));
    candidate.attribution = Some(Attribution::wikipedia(&page.title, url));
    candidate.data_completeness = assess_completeness(&candidate);
    Some(candidate)
}
