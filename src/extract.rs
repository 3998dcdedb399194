//! Shared extraction helpers used by every adapter.
//!
//! Each field has an explicit precedence list; the helpers walk it and fall
//! back to `None` or an empty string instead of failing on odd markup.

use crate::models::{RawCategory, RawFeedItem};
use crate::utils::{collapse_whitespace, non_empty, to_iso8601};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// Trailing boilerplate publishers append to summaries; everything from the
/// match to the end of the string goes.
static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(read (the )?(full )?story|continue reading|explore further:|provided by)")
        .unwrap()
});

/// Object keys that may carry a category's label, in precedence order.
const CATEGORY_KEYS: &[&str] = &["#text", "#", "text", "value", "name", "term", "label"];

/// The item's best HTML body: `content:encoded`, `content`, `description`, `summary`.
pub fn html_body(item: &RawFeedItem) -> &str {
    [
        item.content_encoded.as_deref(),
        item.content.as_deref(),
        item.description.as_deref(),
        item.summary.as_deref(),
    ]
    .into_iter()
    .find_map(non_empty)
    .unwrap_or("")
}

/// Structured media URLs: `media:content` first, then `media:thumbnail`.
fn media_url(item: &RawFeedItem) -> Option<&str> {
    [item.media_content.first(), item.media_thumbnail.first()]
        .into_iter()
        .flatten()
        .find_map(|m| non_empty(m.url.as_deref()))
}

/// `src` of the first `<img>` in an HTML fragment (`data-src` for lazy-loaded images).
pub fn first_img_src(html: &str) -> Option<String> {
    if html.is_empty() {
        return None;
    }
    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("img").unwrap();
    let img = fragment.select(&selector).next()?;
    let el = img.value();
    non_empty(el.attr("src").or_else(|| el.attr("data-src"))).map(str::to_string)
}

/// Resolve `src` into an absolute `http(s)` URL.
///
/// Absolute URLs pass through untouched; relative and protocol-relative ones
/// are joined onto `base`. Anything else (`data:` URIs, unresolvable paths) is `None`.
pub fn absolutize(src: &str, base: Option<&str>) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }
    match Url::parse(src) {
        Ok(url) => matches!(url.scheme(), "http" | "https").then(|| src.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(base?).ok()?;
            let joined = base.join(src).ok()?;
            matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
        }
        Err(_) => None,
    }
}

/// First usable image: structured media field, else the first `<img>` of the body.
///
/// Relative paths are resolved against `base`; a candidate that cannot be made
/// absolute is skipped in favour of the next one.
pub fn extract_image(item: &RawFeedItem, base: Option<&str>) -> Option<String> {
    if let Some(url) = media_url(item).and_then(|src| absolutize(src, base)) {
        return Some(url);
    }
    first_img_src(html_body(item)).and_then(|src| absolutize(&src, base))
}

/// Plain-text summary: tags stripped, whitespace collapsed, trailing
/// boilerplate ("Read the full story…", "Continue reading…", "Explore further:…",
/// "Provided by…") removed.
///
/// Idempotent: `clean_summary(&clean_summary(s)) == clean_summary(s)`.
pub fn clean_summary(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let stripped = TAGS.replace_all(raw, " ");
    let collapsed = collapse_whitespace(&stripped);
    let kept = match BOILERPLATE.find(&collapsed) {
        Some(m) => &collapsed[..m.start()],
        None => collapsed.as_str(),
    };
    kept.trim().to_string()
}

/// Summary from the item body: first non-empty paragraph, else all body text.
///
/// `<br>` separates words; other inline markup does not.
pub fn extract_summary(item: &RawFeedItem) -> String {
    let html = html_body(item);
    if html.is_empty() {
        return String::new();
    }
    let html = LINE_BREAK.replace_all(html, " ");
    let fragment = Html::parse_fragment(&html);
    let selector = Selector::parse("p").unwrap();

    let paragraph = fragment
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .map(|text| clean_summary(&text))
        .find(|text| !text.is_empty());

    match paragraph {
        Some(text) => text,
        None => {
            let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
            clean_summary(&text)
        }
    }
}

fn category_label(category: &RawCategory) -> Option<String> {
    let scalar = |v: &serde_json::Value| match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    };
    let label = match category {
        RawCategory::Text(s) => Some(s.clone()),
        RawCategory::Fields(fields) => CATEGORY_KEYS
            .iter()
            .filter_map(|k| fields.get(*k).and_then(scalar))
            .find(|s| !s.trim().is_empty()),
        RawCategory::Other(v) => scalar(v),
    }?;
    let label = collapse_whitespace(&label);
    (!label.is_empty()).then_some(label)
}

/// Flatten heterogeneous categories into trimmed strings, dropping empty ones.
pub fn normalize_categories(categories: &[RawCategory]) -> Vec<String> {
    categories.iter().filter_map(category_label).collect()
}

/// Publication date as ISO-8601, from `pubDate`, `isoDate`, `published`,
/// `updated`; the first one that parses wins.
pub fn resolve_published_at(item: &RawFeedItem) -> Option<String> {
    [
        item.pub_date.as_deref(),
        item.iso_date.as_deref(),
        item.published.as_deref(),
        item.updated.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find_map(to_iso8601)
}
