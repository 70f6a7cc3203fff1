//! Shared HTTP client for metadata source requests.
//!
//! Wikimedia services ask API clients to send an identifying User-Agent,
//! so unlike a scraper there is a single fixed agent string unless the
//! caller overrides it.

use crate::config::SearchConfig;
use crate::error::SearchError;
use serde_json::Value;
use std::time::Duration;

/// Identifying User-Agent sent to Wikimedia services.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "gameshelf/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/gameshelf/gameshelf)"
);

/// Build a [`reqwest::Client`] configured for metadata source requests.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Send a GET request and decode the JSON body.
///
/// Transport failures and non-success statuses map to
/// [`SearchError::SourceUnavailable`]; undecodable bodies to
/// [`SearchError::MalformedData`].
pub async fn get_json(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, &str)],
    label: &str,
) -> Result<Value, SearchError> {
    let response = client
        .get(url)
        .query(params)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| SearchError::SourceUnavailable(format!("{label} request failed: {e}")))?
        .error_for_status()
        .map_err(|e| SearchError::SourceUnavailable(format!("{label} HTTP error: {e}")))?;

    response
        .json::<Value>()
        .await
        .map_err(|e| SearchError::MalformedData(format!("{label} response not JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn default_user_agent_identifies_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("gameshelf/"));
    }

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&SearchConfig::default()).is_ok());
    }

    #[test]
    fn build_client_with_custom_ua() {
        let config = SearchConfig {
            user_agent: Some("CustomBot/1.0".into()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }

    #[tokio::test]
    async fn get_json_decodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = build_client(&SearchConfig::default()).expect("client");
        let url = format!("{}/api", server.uri());
        let value = get_json(&client, &url, &[("format", "json")], "test")
            .await
            .expect("json");
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn get_json_maps_server_error_to_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = build_client(&SearchConfig::default()).expect("client");
        let err = get_json(&client, &server.uri(), &[], "test").await.unwrap_err();
        assert!(matches!(err, SearchError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn get_json_maps_bad_body_to_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = build_client(&SearchConfig::default()).expect("client");
        let err = get_json(&client, &server.uri(), &[], "test").await.unwrap_err();
        assert!(matches!(err, SearchError::MalformedData(_)));
    }
}
