//! Video game infobox extraction from raw wikitext.
//!
//! Locates the infobox template, splits it into `key = value` parameters,
//! maps keys through [`FIELD_ALIASES`] and strips wiki markup from values.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::{Captures, Regex};

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect(stringify!($name)))
        }
    };
}

static_regex!(comment_re, r"(?s)<!--.*?-->");
static_regex!(self_closing_ref_re, r"(?is)<ref[^>]*/>");
static_regex!(ref_re, r"(?is)<ref[^>]*>.*?</ref>");
static_regex!(file_link_re, r"(?i)\[\[(?:file|image):[^\]]*\]\]");
static_regex!(wikilink_re, r"\[\[(?:[^\]|]*\|)?([^\]|]*)\]\]");
static_regex!(line_break_re, r"(?i)<br\s*/?>");
static_regex!(innermost_template_re, r"\{\{([^{}]*)\}\}");
static_regex!(external_link_re, r"\[https?://[^\s\]]*\s*([^\]]*)\]");
static_regex!(html_tag_re, r"<[^>]+>");
static_regex!(ref_marker_re, r"(?i)\[(?:\d+|citation needed)\]");
static_regex!(emphasis_re, r"'{2,}");
static_regex!(spaces_re, r"[ \t\x{a0}]+");

static_regex!(iso_date_re, r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b");
static_regex!(month_day_year_re, r"\b([A-Za-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})\b");
static_regex!(day_month_year_re, r"\b(\d{1,2})\s+([A-Za-z]+)\.?,?\s+(\d{4})\b");
static_regex!(month_year_re, r"\b([A-Za-z]+)\.?,?\s+(\d{4})\b");
static_regex!(year_re, r"\b(\d{4})\b");

/// Template openings that introduce a video game infobox, tried in order.
pub const INFOBOX_OPENINGS: &[&str] = &[
    "{{Infobox video game",
    "{{Infobox Video Game",
    "{{Infobox videogame",
    "{{Infobox game",
    "{{Video game infobox",
];

/// Canonical infobox fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoboxField {
    Title,
    Developer,
    Publisher,
    ReleaseDate,
    Platforms,
    Genre,
    Modes,
    Series,
}

/// Parameter names accepted for each canonical field. Keys are compared
/// lowercased with underscores read as spaces.
pub const FIELD_ALIASES: &[(InfoboxField, &[&str])] = &[
    (InfoboxField::Title, &["title", "name"]),
    (InfoboxField::Developer, &["developer", "developers"]),
    (InfoboxField::Publisher, &["publisher", "publishers"]),
    (
        InfoboxField::ReleaseDate,
        &["released", "release", "release date", "releasedate", "first release date"],
    ),
    (InfoboxField::Platforms, &["platforms", "platform"]),
    (InfoboxField::Genre, &["genre", "genres"]),
    (InfoboxField::Modes, &["modes", "mode"]),
    (InfoboxField::Series, &["series", "franchise"]),
];

/// Templates whose positional arguments are list items.
const LIST_TEMPLATES: &[&str] = &[
    "plainlist",
    "plain list",
    "flatlist",
    "ubl",
    "unbulleted list",
    "bulleted list",
    "hlist",
    "collapsible list",
    "nowrap",
];

/// Templates pairing region codes with release dates.
const RELEASE_TEMPLATES: &[&str] = &["video game release", "vgrelease", "vgr"];

/// Templates taking a numeric `year|month|day` date.
const DATE_TEMPLATES: &[&str] = &[
    "start date",
    "start date and age",
    "release date",
    "release date and age",
    "dts",
];

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
];

/// Fields read from a game infobox, values already cleaned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Infobox {
    pub title: Option<String>,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub release_date: Option<String>,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
    pub modes: Vec<String>,
    pub series: Option<String>,
}

impl Infobox {
    /// Whether no known field was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.developers.is_empty()
            && self.publishers.is_empty()
            && self.release_date.is_none()
            && self.platforms.is_empty()
            && self.genres.is_empty()
            && self.modes.is_empty()
            && self.series.is_none()
    }
}

/// Canonical field for an infobox parameter name.
pub fn field_for_key(key: &str) -> Option<InfoboxField> {
    let key = key.trim().to_lowercase().replace('_', " ");
    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&key.as_str()))
        .map(|(field, _)| *field)
}

/// Locate the infobox and return the text between its braces.
///
/// An unterminated template runs to the end of the text.
pub fn find_infobox(wikitext: &str) -> Option<&str> {
    INFOBOX_OPENINGS.iter().find_map(|opening| {
        wikitext.match_indices(opening).find_map(|(start, _)| {
            // The template name must end right after the opening.
            let rest = &wikitext[start + opening.len()..];
            let name_tail = rest.split(['|', '\n', '}']).next().unwrap_or_default();
            name_tail
                .trim()
                .is_empty()
                .then(|| template_body(wikitext, start))
        })
    })
}

fn template_body(text: &str, start: usize) -> &str {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                depth += 1;
                i += 2;
            }
            (b'}', b'}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[start + 2..i];
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    &text[start + 2..]
}

/// Split a template body on `|` separators that are not nested inside
/// another template or a link. The first element is the template name.
fn split_top_level(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let pair = bytes.get(i + 1).map(|next| (bytes[i], *next));
        match pair {
            Some((b'{', b'{') | (b'[', b'[')) => {
                depth += 1;
                i += 2;
                continue;
            }
            Some((b'}', b'}') | (b']', b']')) => {
                depth = depth.saturating_sub(1);
                i += 2;
                continue;
            }
            _ => {}
        }
        if bytes[i] == b'|' && depth == 0 {
            parts.push(&body[last..i]);
            last = i + 1;
        }
        i += 1;
    }
    parts.push(&body[last..]);
    parts
}

/// Named `key = value` parameters of a template body, in order.
pub fn parameters(body: &str) -> Vec<(String, String)> {
    split_top_level(body)
        .into_iter()
        .skip(1)
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

/// Parse the infobox in `wikitext`.
///
/// Returns `None` when there is no infobox or none of its parameters maps
/// to a known field. The first parameter for a field wins.
pub fn parse_infobox(wikitext: &str) -> Option<Infobox> {
    let body = find_infobox(wikitext)?;
    let mut infobox = Infobox::default();

    for (key, raw) in parameters(body) {
        let Some(field) = field_for_key(&key) else {
            continue;
        };
        let value = clean_value(&raw);
        if value.is_empty() {
            continue;
        }
        match field {
            InfoboxField::Title if infobox.title.is_none() => {
                infobox.title = Some(single_line(&value));
            }
            InfoboxField::Developer if infobox.developers.is_empty() => {
                infobox.developers = split_list(&value);
            }
            InfoboxField::Publisher if infobox.publishers.is_empty() => {
                infobox.publishers = split_list(&value);
            }
            InfoboxField::ReleaseDate if infobox.release_date.is_none() => {
                infobox.release_date = normalize_release_date(&value);
            }
            InfoboxField::Platforms if infobox.platforms.is_empty() => {
                infobox.platforms = split_list(&value);
            }
            InfoboxField::Genre if infobox.genres.is_empty() => {
                infobox.genres = split_list(&value);
            }
            InfoboxField::Modes if infobox.modes.is_empty() => {
                infobox.modes = split_list(&value);
            }
            InfoboxField::Series if infobox.series.is_none() => {
                infobox.series = value.lines().next().map(str::to_owned);
            }
            _ => {}
        }
    }

    (!infobox.is_empty()).then_some(infobox)
}

fn expand_template(caps: &Captures<'_>) -> String {
    let mut parts = caps[1].split('|');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let positional: Vec<&str> = parts
        .filter(|arg| !arg.contains('='))
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .collect();

    if LIST_TEMPLATES.contains(&name.as_str()) {
        positional.join("\n")
    } else if RELEASE_TEMPLATES.contains(&name.as_str()) {
        positional
            .into_iter()
            .filter(|arg| !is_region_code(arg))
            .collect::<Vec<_>>()
            .join("\n")
    } else if DATE_TEMPLATES.contains(&name.as_str()) {
        numeric_date(&positional).unwrap_or_default()
    } else {
        String::new()
    }
}

fn is_region_code(arg: &str) -> bool {
    arg.len() <= 4 && arg.chars().all(|c| c.is_ascii_uppercase())
}

fn numeric_date(args: &[&str]) -> Option<String> {
    let numbers: Vec<u32> = args.iter().map_while(|a| a.parse().ok()).collect();
    match numbers.as_slice() {
        [y, m, d, ..] => Some(format!("{y:04}-{m:02}-{d:02}")),
        [y, m] => Some(format!("{y:04}-{m:02}")),
        [y] => Some(format!("{y:04}")),
        [] => None,
    }
}

/// Strip wiki markup from an infobox value.
///
/// List items end up on separate lines; everything else is plain text
/// with collapsed whitespace.
pub fn clean_value(raw: &str) -> String {
    let mut text = comment_re().replace_all(raw, "").into_owned();
    text = self_closing_ref_re().replace_all(&text, "").into_owned();
    text = ref_re().replace_all(&text, "").into_owned();
    text = file_link_re().replace_all(&text, "").into_owned();
    text = wikilink_re().replace_all(&text, "$1").into_owned();
    text = line_break_re().replace_all(&text, "\n").into_owned();

    // Expand innermost templates until none remain.
    while innermost_template_re().is_match(&text) {
        text = innermost_template_re()
            .replace_all(&text, expand_template)
            .into_owned();
    }
    text = text.replace("{{", "").replace("}}", "");

    text = external_link_re().replace_all(&text, "$1").into_owned();
    text = html_tag_re().replace_all(&text, "").into_owned();
    text = ref_marker_re().replace_all(&text, "").into_owned();
    text = emphasis_re().replace_all(&text, "").into_owned();
    text = text.replace("&nbsp;", " ").replace("&amp;", "&");

    text.lines()
        .map(|line| line.trim().trim_start_matches(['*', '#']).trim())
        .map(|line| spaces_re().replace_all(line, " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_line(value: &str) -> String {
    value.lines().collect::<Vec<_>>().join(" ")
}

/// Split a cleaned value into list items on commas, semicolons and line
/// breaks. Items are trimmed and de-duplicated case-insensitively.
pub fn split_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split([',', ';', '\n']) {
        let item = item.trim();
        if item.is_empty() || items.iter().any(|i| i.eq_ignore_ascii_case(item)) {
            continue;
        }
        items.push(item.to_owned());
    }
    items
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_lowercase();
    MONTHS
        .iter()
        .find(|(month, _)| *month == name)
        .map(|(_, n)| *n)
}

fn ymd(year: &str, month: u32, day: &str) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Normalise a cleaned release-date value.
///
/// Tries full dates (ISO, `March 3, 2017`, `3 March 2017`), then
/// month-year (`2017-03`), then a bare year, then RFC 3339 / RFC 2822.
/// Anything else is returned as written. Returns `None` for blank input.
pub fn normalize_release_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let full = iso_date_re()
        .captures_iter(value)
        .find_map(|c| ymd(&c[1], c[2].parse().ok()?, &c[3]))
        .or_else(|| {
            month_day_year_re()
                .captures_iter(value)
                .find_map(|c| ymd(&c[3], month_number(&c[1])?, &c[2]))
        })
        .or_else(|| {
            day_month_year_re()
                .captures_iter(value)
                .find_map(|c| ymd(&c[3], month_number(&c[2])?, &c[1]))
        });
    if full.is_some() {
        return full;
    }

    if let Some(month_year) = month_year_re()
        .captures_iter(value)
        .find_map(|c| Some(format!("{}-{:02}", &c[2], month_number(&c[1])?)))
    {
        return Some(month_year);
    }

    if let Some(c) = year_re().captures(value) {
        return Some(c[1].to_owned());
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .ok()
        .or_else(|| Some(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELESTE: &str = r#"{{Short description|2018 video game}}
{{Use mdy dates|date=January 2018}}
{{Infobox video game
| title = ''Celeste''
| image = Celeste box art final.png
| developer = Maddy Makes Games{{efn|Formerly Matt Makes Games}}
| publisher = Maddy Makes Games
| designer = [[Maddy Thorson]]
| platforms = {{Plainlist|
* [[Linux]]
* [[macOS]]
* [[Microsoft Windows|Windows]]
* [[Nintendo Switch]]
* [[PlayStation 4]]
* [[Xbox One]]
}}
| released = {{Video game release|WW|January 25, 2018}}<ref name="launch">{{cite web|url=https://example.com|title=Launch}}</ref>
| genre = [[Platform game|Platform]]
| modes = [[Single-player video game|Single-player]]
}}
'''''Celeste''''' is a 2018 [[platform game]]."#;

    #[test]
    fn finds_infobox_body() {
        let body = find_infobox(CELESTE).expect("infobox");
        assert!(body.starts_with("Infobox video game"));
        assert!(body.contains("Single-player"));
        assert!(!body.contains("is a 2018"));
    }

    #[test]
    fn alternate_openings_are_recognised() {
        let text = "{{Infobox videogame\n| developer = id Software\n}}";
        assert!(find_infobox(text).is_some());
        let text = "{{Infobox game show\n| host = Someone\n}}";
        assert!(find_infobox(text).is_none());
    }

    #[test]
    fn parses_celeste_infobox() {
        let infobox = parse_infobox(CELESTE).expect("infobox");
        assert_eq!(infobox.title.as_deref(), Some("Celeste"));
        assert_eq!(infobox.developers, vec!["Maddy Makes Games"]);
        assert_eq!(infobox.publishers, vec!["Maddy Makes Games"]);
        assert_eq!(infobox.release_date.as_deref(), Some("2018-01-25"));
        assert_eq!(
            infobox.platforms,
            vec!["Linux", "macOS", "Windows", "Nintendo Switch", "PlayStation 4", "Xbox One"]
        );
        assert_eq!(infobox.genres, vec!["Platform"]);
        assert_eq!(infobox.modes, vec!["Single-player"]);
        assert!(infobox.series.is_none());
    }

    #[test]
    fn no_infobox_or_no_known_fields() {
        assert!(parse_infobox("'''Celeste''' is a name.").is_none());
        assert!(parse_infobox("{{Infobox video game\n| image = x.png\n}}").is_none());
    }

    #[test]
    fn alias_table_maps_variants() {
        assert_eq!(field_for_key(" Release_Date "), Some(InfoboxField::ReleaseDate));
        assert_eq!(field_for_key("Developers"), Some(InfoboxField::Developer));
        assert_eq!(field_for_key("franchise"), Some(InfoboxField::Series));
        assert_eq!(field_for_key("image"), None);
    }

    #[test]
    fn first_alias_wins() {
        let text = "{{Infobox video game\n| developer = id Software\n| developers = Raven\n}}";
        let infobox = parse_infobox(text).expect("infobox");
        assert_eq!(infobox.developers, vec!["id Software"]);
    }

    #[test]
    fn cleans_links_refs_and_markers() {
        assert_eq!(clean_value("[[Nintendo EPD|Nintendo]][1]"), "Nintendo");
        assert_eq!(
            clean_value("[https://example.com Official site] <small>(EU)</small>"),
            "Official site (EU)"
        );
        assert_eq!(clean_value("id Software<ref>{{cite web|url=x}}</ref>"), "id Software");
        assert_eq!(clean_value("Valve<ref name=\"v\" />"), "Valve");
        assert_eq!(clean_value("A<!-- hidden -->B"), "AB");
        assert_eq!(clean_value("[[File:Logo.png|20px]] Sega"), "Sega");
    }

    #[test]
    fn line_breaks_and_lists_split() {
        let value = clean_value("[[Windows]]<br />[[macOS]]<br>Linux");
        assert_eq!(split_list(&value), vec!["Windows", "macOS", "Linux"]);
        assert_eq!(split_list("Action, adventure; Action"), vec!["Action", "adventure"]);
        let value = clean_value("{{ubl|[[Single-player]]|[[Multiplayer]]}}");
        assert_eq!(split_list(&value), vec!["Single-player", "Multiplayer"]);
    }

    #[test]
    fn unknown_templates_are_stripped() {
        assert_eq!(clean_value("Nintendo{{efn|note}}"), "Nintendo");
        assert_eq!(clean_value("{{outer|{{inner}}}}Sony"), "Sony");
    }

    #[test]
    fn release_templates_keep_dates() {
        let value = clean_value("{{Video game release|NA|March 3, 2017|EU|March 4, 2017}}");
        assert_eq!(normalize_release_date(&value).as_deref(), Some("2017-03-03"));
        let value = clean_value("{{Start date|1993|12|10}}");
        assert_eq!(normalize_release_date(&value).as_deref(), Some("1993-12-10"));
    }

    #[test]
    fn date_patterns() {
        assert_eq!(normalize_release_date("March 3, 2017").as_deref(), Some("2017-03-03"));
        assert_eq!(normalize_release_date("3 Mar 2017").as_deref(), Some("2017-03-03"));
        assert_eq!(normalize_release_date("Sept. 9, 1999").as_deref(), Some("1999-09-09"));
        assert_eq!(normalize_release_date("2017/3/3").as_deref(), Some("2017-03-03"));
        assert_eq!(normalize_release_date("December 1993").as_deref(), Some("1993-12"));
        assert_eq!(normalize_release_date("1993").as_deref(), Some("1993"));
        assert_eq!(normalize_release_date("TBA").as_deref(), Some("TBA"));
        assert_eq!(normalize_release_date("  "), None);
    }

    #[test]
    fn invalid_calendar_dates_fall_through() {
        assert_eq!(normalize_release_date("February 30, 2017").as_deref(), Some("2017"));
    }
}
