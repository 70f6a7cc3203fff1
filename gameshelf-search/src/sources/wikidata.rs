//! Wikidata source: structured game metadata via the SPARQL query service.
//!
//! One query selects every video game (`P31 = Q7889`) whose label contains
//! the search text, joined with the optional properties a catalogue entry
//! needs. The service returns one row per combination of multi-valued
//! properties, so rows are grouped back into one candidate per entity.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::orchestrator::scoring::assess_completeness;
use crate::source::MetadataSource;
use crate::types::{Attribution, Candidate, Source};

use super::images::{thumbnail_url, validate_image_url};
use super::stores::extract_store_links;

/// Wikidata class for "video game".
const VIDEO_GAME_CLASS: &str = "Q7889";

/// Metadata source backed by the Wikidata SPARQL endpoint.
#[derive(Debug, Clone)]
pub struct WikidataSource {
    client: reqwest::Client,
    endpoint: String,
    language: String,
    row_limit: usize,
}

impl WikidataSource {
    /// Create a source using the endpoint and limits from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            endpoint: config.wikidata_endpoint.clone(),
            language: config.language.clone(),
            row_limit: config.wikidata_row_limit,
        })
    }

    async fn query(&self, title: &str) -> Result<Vec<Candidate>, SearchError> {
        let sparql = build_query(title, &self.language, self.row_limit);
        let body = http::get_json(
            &self.client,
            &self.endpoint,
            &[("query", sparql.as_str()), ("format", "json")],
            "Wikidata",
        )
        .await?;
        parse_sparql_response(body, title)
    }
}

impl MetadataSource for WikidataSource {
    async fn fetch(&self, title: &str) -> Result<Vec<Candidate>, SearchError> {
        tracing::trace!(title, "Wikidata search");
        match self.query(title).await {
            Ok(candidates) => {
                tracing::debug!(count = candidates.len(), "Wikidata results parsed");
                Ok(candidates)
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(error = %err, "Wikidata lookup failed");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    fn source_type(&self) -> Source {
        Source::Wikidata
    }
}

/// Escape text for use inside a double-quoted SPARQL string literal.
pub fn escape_sparql_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Build the SPARQL query for `title`.
pub fn build_query(title: &str, language: &str, limit: usize) -> String {
    let text = escape_sparql_literal(title.trim());
    let lang = escape_sparql_literal(language);
    format!(
        r#"SELECT ?game ?gameLabel ?description ?releaseDate ?platformLabel ?developerLabel ?publisherLabel ?genreLabel ?image ?website ?seriesLabel ?modeLabel WHERE {{
  ?game wdt:P31 wd:{VIDEO_GAME_CLASS} ;
        rdfs:label ?label .
  FILTER(LANG(?label) = "{lang}")
  FILTER(CONTAINS(LCASE(?label), LCASE("{text}")))
  OPTIONAL {{ ?game schema:description ?description . FILTER(LANG(?description) = "{lang}") }}
  OPTIONAL {{ ?game wdt:P577 ?releaseDate . }}
  OPTIONAL {{ ?game wdt:P400 ?platform . }}
  OPTIONAL {{ ?game wdt:P178 ?developer . }}
  OPTIONAL {{ ?game wdt:P123 ?publisher . }}
  OPTIONAL {{ ?game wdt:P136 ?genre . }}
  OPTIONAL {{ ?game wdt:P18 ?image . }}
  OPTIONAL {{ ?game wdt:P856 ?website . }}
  OPTIONAL {{ ?game wdt:P179 ?series . }}
  OPTIONAL {{ ?game wdt:P404 ?mode . }}
  SERVICE wikibase:label {{ bd:serviceParam wikibase:language "{lang},en". }}
}}
LIMIT {limit}"#
    )
}

/// Normalise a Wikidata time value (`+2017-03-03T00:00:00Z`) to
/// `YYYY-MM-DD`. Returns `None` when the date part does not parse.
pub fn normalize_date(raw: &str) -> Option<String> {
    let unsigned = raw.trim().trim_start_matches(['+', '-']);
    let date = unsigned.split('T').next()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

/// A label the label service could not resolve comes back as the bare
/// entity id.
fn is_unresolved_label(label: &str) -> bool {
    label
        .strip_prefix('Q')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Deserialize)]
struct SparqlResponse {
    results: SparqlResults,
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Accumulated values for one entity across its result rows.
#[derive(Debug, Default)]
struct EntityRows {
    qid: String,
    label: Option<String>,
    description: Option<String>,
    release_dates: Vec<String>,
    platforms: Vec<String>,
    developers: Vec<String>,
    publishers: Vec<String>,
    genres: Vec<String>,
    images: Vec<String>,
    websites: Vec<String>,
    series: Vec<String>,
    modes: Vec<String>,
}

fn push_unique(values: &mut Vec<String>, value: Option<&str>) {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return;
    };
    if !values.iter().any(|v| v == value) {
        values.push(value.to_owned());
    }
}

fn push_label(values: &mut Vec<String>, value: Option<&str>) {
    push_unique(values, value.filter(|v| !is_unresolved_label(v)));
}

impl EntityRows {
    fn absorb(&mut self, row: &HashMap<String, SparqlTerm>) {
        let get = |key: &str| row.get(key).map(|t| t.value.as_str());

        if self.label.is_none() {
            self.label = get("gameLabel")
                .map(str::trim)
                .filter(|l| !l.is_empty() && !is_unresolved_label(l))
                .map(str::to_owned);
        }
        if self.description.is_none() {
            self.description = get("description")
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned);
        }
        push_unique(&mut self.release_dates, get("releaseDate"));
        push_label(&mut self.platforms, get("platformLabel"));
        push_label(&mut self.developers, get("developerLabel"));
        push_label(&mut self.publishers, get("publisherLabel"));
        push_label(&mut self.genres, get("genreLabel"));
        push_unique(&mut self.images, get("image"));
        push_unique(&mut self.websites, get("website"));
        push_label(&mut self.series, get("seriesLabel"));
        push_label(&mut self.modes, get("modeLabel"));
    }

    fn into_candidate(self, query: &str) -> Option<Candidate> {
        let Some(label) = self.label else {
            tracing::trace!(qid = %self.qid, "skipping entity without a label");
            return None;
        };
        let mut candidate = Candidate::new(
            format!("wikidata-{}", self.qid),
            &label,
            Source::Wikidata,
            query,
        )?;

        candidate.source_id = Some(self.qid.clone());
        candidate.description = self.description;
        // Regional releases: the earliest parseable date is the release.
        candidate.release_date = self
            .release_dates
            .iter()
            .filter_map(|d| normalize_date(d))
            .min();
        candidate.developer = self.developers.first().cloned();
        candidate.publisher = self.publishers.first().cloned();
        candidate.developers = self.developers;
        candidate.publishers = self.publishers;
        candidate.platforms = self.platforms;
        candidate.genre = self.genres;
        candidate.modes = self.modes;
        candidate.series = self.series.into_iter().next();
        candidate.cover_image = self.images.iter().find_map(|i| validate_image_url(i));
        candidate.thumbnail = candidate.cover_image.as_deref().and_then(thumbnail_url);
        candidate.official_store_links = extract_store_links(self.websites.iter().map(String::as_str));
        candidate.official_website = self.websites.into_iter().next();
        candidate.attribution = Some(Attribution::wikidata(&self.qid));
        candidate.data_completeness = assess_completeness(&candidate);
        Some(candidate)
    }
}

/// Parse a SPARQL JSON response into candidates, one per entity, in the
/// order entities first appear.
///
/// Extracted as a separate function for testability with canned JSON.
pub(crate) fn parse_sparql_response(
    body: Value,
    query: &str,
) -> Result<Vec<Candidate>, SearchError> {
    let response: SparqlResponse = serde_json::from_value(body)
        .map_err(|e| SearchError::MalformedData(format!("Wikidata results: {e}")))?;

    let mut order: Vec<EntityRows> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in &response.results.bindings {
        let Some(qid) = row
            .get("game")
            .and_then(|t| t.value.rsplit('/').next())
            .filter(|q| !q.is_empty())
        else {
            continue;
        };
        let slot = *index.entry(qid.to_owned()).or_insert_with(|| {
            order.push(EntityRows {
                qid: qid.to_owned(),
                ..EntityRows::default()
            });
            order.len() - 1
        });
        order[slot].absorb(row);
    }

    Ok(order
        .into_iter()
        .filter_map(|entity| entity.into_candidate(query))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn binding(fields: &[(&str, &str)]) -> Value {
        let mut row = serde_json::Map::new();
        for (key, value) in fields {
            row.insert((*key).to_owned(), json!({ "type": "literal", "value": value }));
        }
        Value::Object(row)
    }

    fn response(rows: Vec<Value>) -> Value {
        json!({ "head": { "vars": [] }, "results": { "bindings": rows } })
    }

    fn botw_rows() -> Vec<Value> {
        let game = "http://www.wikidata.org/entity/Q20155174";
        vec![
            binding(&[
                ("game", game),
                ("gameLabel", "The Legend of Zelda: Breath of the Wild"),
                ("releaseDate", "+2017-03-03T00:00:00Z"),
                ("platformLabel", "Nintendo Switch"),
                ("developerLabel", "Nintendo EPD"),
                ("publisherLabel", "Nintendo"),
                ("genreLabel", "action-adventure game"),
                ("image", "http://commons.wikimedia.org/wiki/Special:FilePath/BotW%20logo.png"),
                ("website", "https://www.zelda.com/breath-of-the-wild/"),
            ]),
            binding(&[
                ("game", game),
                ("gameLabel", "The Legend of Zelda: Breath of the Wild"),
                ("releaseDate", "+2017-03-02T00:00:00Z"),
                ("platformLabel", "Wii U"),
                ("developerLabel", "Nintendo EPD"),
                ("publisherLabel", "Nintendo"),
                ("genreLabel", "Q123456"),
                ("website", "https://www.nintendo.com/store/products/zelda-botw-switch/"),
            ]),
        ]
    }

    #[test]
    fn escapes_sparql_literals() {
        assert_eq!(escape_sparql_literal(r#"Say "hi"\now"#), r#"Say \"hi\"\\now"#);
        assert_eq!(escape_sparql_literal("a\nb"), "a\\nb");
        assert_eq!(escape_sparql_literal("Baldur's Gate"), "Baldur\\'s Gate");
    }

    #[test]
    fn query_contains_filter_and_limit() {
        let q = build_query(" Celeste ", "en", 50);
        assert!(q.contains("wd:Q7889"));
        assert!(q.contains(r#"LCASE("Celeste")"#));
        assert!(q.contains("wdt:P404"));
        assert!(q.trim_end().ends_with("LIMIT 50"));
    }

    #[test]
    fn normalizes_signed_dates() {
        assert_eq!(normalize_date("+2017-03-03T00:00:00Z").as_deref(), Some("2017-03-03"));
        assert_eq!(normalize_date("1993-12-10T00:00:00Z").as_deref(), Some("1993-12-10"));
        assert_eq!(normalize_date("+2017-00-00T00:00:00Z"), None);
        assert_eq!(normalize_date("soon"), None);
    }

    #[test]
    fn rows_grouped_into_one_candidate() {
        let candidates =
            parse_sparql_response(response(botw_rows()), "Breath of the Wild").expect("parse");
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.id, "wikidata-Q20155174");
        assert_eq!(c.source_id.as_deref(), Some("Q20155174"));
        assert_eq!(c.platforms, vec!["Nintendo Switch", "Wii U"]);
        assert_eq!(c.release_date.as_deref(), Some("2017-03-02"));
        assert_eq!(c.developer.as_deref(), Some("Nintendo EPD"));
        assert_eq!(c.developers.len(), 1);
        // Unresolved genre label dropped.
        assert_eq!(c.genre, vec!["action-adventure game"]);
        assert_eq!(c.search_metadata.query, "Breath of the Wild");
    }

    #[test]
    fn images_websites_and_attribution() {
        let candidates =
            parse_sparql_response(response(botw_rows()), "Breath of the Wild").expect("parse");
        let c = &candidates[0];
        let cover = c.cover_image.as_deref().expect("cover");
        assert!(cover.starts_with("https://commons.wikimedia.org/"));
        assert!(c.thumbnail.as_deref().is_some_and(|t| t.ends_with("?width=300")));
        assert_eq!(
            c.official_website.as_deref(),
            Some("https://www.zelda.com/breath-of-the-wild/")
        );
        assert!(c.official_store_links.contains_key("nintendo"));
        let attribution = c.attribution.as_ref().expect("attribution");
        assert_eq!(attribution.license, "CC0 1.0");
    }

    #[test]
    fn completeness_attached() {
        let candidates =
            parse_sparql_response(response(botw_rows()), "Breath of the Wild").expect("parse");
        let completeness = &candidates[0].data_completeness;
        assert!((completeness.score - 7.0 / 8.0).abs() < 1e-9);
        assert_eq!(completeness.missing_fields, vec!["description"]);
        assert!(completeness.fallback_needed);
    }

    #[test]
    fn unlabelled_entities_are_skipped() {
        let rows = vec![
            binding(&[("game", "http://www.wikidata.org/entity/Q1"), ("gameLabel", "Q1")]),
            binding(&[("game", "http://www.wikidata.org/entity/Q2"), ("gameLabel", "Celeste")]),
        ];
        let candidates = parse_sparql_response(response(rows), "Celeste").expect("parse");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Celeste");
    }

    #[test]
    fn entity_order_is_first_seen() {
        let rows = vec![
            binding(&[("game", "http://www.wikidata.org/entity/Q2"), ("gameLabel", "Doom II")]),
            binding(&[("game", "http://www.wikidata.org/entity/Q1"), ("gameLabel", "Doom")]),
            binding(&[("game", "http://www.wikidata.org/entity/Q2"), ("platformLabel", "MS-DOS")]),
        ];
        let candidates = parse_sparql_response(response(rows), "Doom").expect("parse");
        let titles: Vec<&str> = candidates.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Doom II", "Doom"]);
        assert_eq!(candidates[0].platforms, vec!["MS-DOS"]);
    }

    #[test]
    fn missing_results_is_malformed() {
        let err = parse_sparql_response(json!({ "head": {} }), "x").unwrap_err();
        assert!(matches!(err, SearchError::MalformedData(_)));
    }

    fn config_for(server: &MockServer) -> SearchConfig {
        SearchConfig {
            wikidata_endpoint: format!("{}/sparql", server.uri()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fetch_against_mock_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sparql"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response(botw_rows())))
            .expect(1)
            .mount(&server)
            .await;

        let source = WikidataSource::new(&config_for(&server)).expect("source");
        let candidates = source.fetch("Breath of the Wild").await.expect("fetch");
        assert_eq!(candidates.len(), 1);
        assert_eq!(source.source_type(), Source::Wikidata);
    }

    #[tokio::test]
    async fn server_error_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sparql"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = WikidataSource::new(&config_for(&server)).expect("source");
        let candidates = source.fetch("Celeste").await.expect("recovered");
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn garbage_body_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sparql"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let source = WikidataSource::new(&config_for(&server)).expect("source");
        assert!(source.fetch("Celeste").await.expect("recovered").is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn live_wikidata_search() {
        let source = WikidataSource::new(&SearchConfig::default()).expect("source");
        let candidates = source.fetch("Celeste").await.expect("fetch");
        assert!(candidates.iter().any(|c| c.title == "Celeste"));
    }
}
