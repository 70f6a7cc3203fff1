//! Cover image validation and Wikimedia Commons thumbnails.

use url::Url;

/// File extensions accepted as cover images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];

/// Width of derived thumbnails, in pixels.
pub const THUMBNAIL_WIDTH: u32 = 300;

/// Validate a cover image URL.
///
/// The URL must be `https` and end in a recognised image extension.
/// Plain-`http` Wikimedia links, as returned by the Wikidata query
/// service, are upgraded first.
pub fn validate_image_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    let wikimedia = url
        .host_str()
        .is_some_and(|h| h.ends_with("wikimedia.org") || h.ends_with("wikipedia.org"));
    if url.scheme() == "http" && wikimedia {
        url.set_scheme("https").ok()?;
    }
    if url.scheme() != "https" {
        return None;
    }

    let path = url.path().to_ascii_lowercase();
    let (_, ext) = path.rsplit_once('.')?;
    IMAGE_EXTENSIONS.contains(&ext).then(|| url.to_string())
}

/// Derive a thumbnail URL from a Commons image URL.
///
/// `Special:FilePath/<name>` links take a `width` parameter; direct
/// `upload.wikimedia.org` links are rewritten to the `thumb/` layout.
/// Other hosts have no known thumbnail scheme.
pub fn thumbnail_url(image: &str) -> Option<String> {
    let mut url = Url::parse(image).ok()?;

    if url.path().contains("/Special:FilePath/") {
        url.set_query(Some(&format!("width={THUMBNAIL_WIDTH}")));
        return Some(url.to_string());
    }

    if url.host_str() != Some("upload.wikimedia.org") {
        return None;
    }
    let segments: Vec<&str> = url.path().trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        [project, wiki, shard, subshard, name] if *shard != "thumb" => {
            // SVGs are rasterised, so the thumbnail name gains a .png suffix.
            let thumb_name = if name.to_ascii_lowercase().ends_with(".svg") {
                format!("{name}.png")
            } else {
                (*name).to_owned()
            };
            Some(format!(
                "https://upload.wikimedia.org/{project}/{wiki}/thumb/{shard}/{subshard}/{name}/{THUMBNAIL_WIDTH}px-{thumb_name}"
            ))
        }
        _ => None,
    }
}
