//! Recognition of digital storefront URLs.
//!
//! Official-website URLs reported by a source are matched against one
//! domain pattern per store; the first URL matching a store wins.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Store name and the URL pattern identifying it.
const STORE_PATTERNS: &[(&str, &str)] = &[
    ("steam", r"(?i)^https?://(?:store\.)?steampowered\.com/app/\d+"),
    ("gog", r"(?i)^https?://(?:www\.)?gog\.com/(?:[a-z]{2}/)?game/"),
    ("epic", r"(?i)^https?://(?:www\.|store\.)?epicgames\.com/"),
    ("playstation", r"(?i)^https?://(?:store\.)?playstation\.com/"),
    ("xbox", r"(?i)^https?://(?:www\.)?(?:xbox\.com/(?:[a-z]{2}-[a-z]{2}/)?games/|microsoft\.com/(?:[a-z]{2}-[a-z]{2}/)?(?:store|p)/)"),
    ("nintendo", r"(?i)^https?://(?:www\.)?nintendo\.com/(?:[a-z]{2}(?:-[a-z]{2})?/)?(?:store|games)/"),
    ("itch", r"(?i)^https?://[a-z0-9-]+\.itch\.io/"),
    ("humble", r"(?i)^https?://(?:www\.)?humblebundle\.com/store/"),
];

fn compiled() -> &'static [(&'static str, Regex)] {
    static COMPILED: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        STORE_PATTERNS
            .iter()
            .filter_map(|(store, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((*store, re)),
                Err(e) => {
                    tracing::error!(store, error = %e, "invalid store pattern");
                    None
                }
            })
            .collect()
    })
}

/// Which store a URL belongs to, if any.
pub fn store_for_url(url: &str) -> Option<&'static str> {
    compiled()
        .iter()
        .find(|(_, re)| re.is_match(url))
        .map(|(store, _)| *store)
}

/// Map store name → URL from a list of candidate URLs.
pub fn extract_store_links<'a>(urls: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    for url in urls {
        if let Some(store) = store_for_url(url) {
            links
                .entry(store.to_owned())
                .or_insert_with(|| url.to_owned());
        }
    }
    links
}
