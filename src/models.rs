//! Data models for feed configuration, raw feed items and normalized articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FeedSource`] and [`Adapter`]: static registry entries binding a feed URL to its normalization policy
//! - [`RawFeedItem`]: typed intermediate record for one `<item>`/`<entry>`, whatever the publisher put in it
//! - [`Article`]: the normalized record handed to the snapshot writers and renderers
//! - [`Newsletter`]: the `{ date, subject, intro, articles }` snapshot document
//!
//! `RawFeedItem` and `Article` keep the camelCase/colon field names used by the
//! rss-parser style JSON and by the YAML snapshot, hence the serde renames.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One configured RSS/Atom endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Display name; always becomes [`Article::source`].
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Normalization policy for items of this feed.
    pub adapter: Adapter,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, adapter: Adapter) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            adapter,
        }
    }
}

/// Normalization policy bound to a feed.
///
/// Serialized with a `kind` tag so a registry file reads like:
///
/// ```yaml
/// adapter:
///   kind: category_gated
///   base_url: https://news.mit.edu
///   allow: [Robotics, Engineering]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adapter {
    /// Image from media fields or the first `<img>` of the body, summary from the first paragraph.
    GenericMedia,
    /// Generic extraction plus a topic allow-list over the item's categories.
    CategoryGated(CategoryGate),
    /// Image taken from the article's own page, with a keyword-chosen asset as fallback.
    OriginPageImage(FallbackImages),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGate {
    /// Origin that relative image paths are resolved against.
    pub base_url: String,
    /// Topic keywords; matched as case-insensitive substrings of each category.
    pub allow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackImages {
    /// Absolute URL prefix of the placeholder assets.
    pub asset_base: String,
    /// Checked in order against the feed name; first hit wins.
    #[serde(default)]
    pub rules: Vec<KeywordAsset>,
    /// Asset used when no rule matches.
    pub default_asset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAsset {
    pub keyword: String,
    pub asset: String,
}

/// Channel-level metadata of a fetched feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub link: Option<String>,
}

/// A media reference (`media:content` / `media:thumbnail`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MediaRef {
    #[serde(default)]
    pub url: Option<String>,
}

/// A category as publishers ship it: a bare string, an attribute bag, or a scalar.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCategory {
    Text(String),
    Fields(BTreeMap<String, serde_json::Value>),
    Other(serde_json::Value),
}

/// One raw feed entry, before any adapter has looked at it.
///
/// Every field is optional; no two publishers fill the same subset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFeedItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default, rename = "isoDate")]
    pub iso_date: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "content:encoded")]
    pub content_encoded: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub categories: Vec<RawCategory>,
    #[serde(default, rename = "media:content", deserialize_with = "one_or_many")]
    pub media_content: Vec<MediaRef>,
    #[serde(default, rename = "media:thumbnail", deserialize_with = "one_or_many")]
    pub media_thumbnail: Vec<MediaRef>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Accept `null`, a single value or a sequence for list-shaped fields.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(v)) => vec![v],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// A normalized article, as consumed by the snapshot writer and renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub url: String,
    /// Plain text; may be empty.
    pub summary: String,
    /// Absolute `http(s)` URL or `None`.
    pub image_url: Option<String>,
    pub categories: Vec<String>,
    /// ISO-8601 UTC timestamp (`2025-05-06T14:30:00.000Z`) or `None`.
    pub published_at: Option<String>,
    pub source: String,
}

/// The daily snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Newsletter {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub subject: String,
    pub intro: String,
    pub articles: Vec<Article>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_item_media_single_object() {
        let json = r#"{
            "title": "Robot hand",
            "link": "https://example.com/a",
            "media:content": { "url": "https://example.com/a.jpg" }
        }"#;
        let item: RawFeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.media_content.len(), 1);
        assert_eq!(
            item.media_content[0].url.as_deref(),
            Some("https://example.com/a.jpg")
        );
        assert!(item.media_thumbnail.is_empty());
    }

    #[test]
    fn test_raw_item_media_sequence_and_null_categories() {
        let json = r#"{
            "media:thumbnail": [{ "url": "https://x/1.jpg" }, { "url": "https://x/2.jpg" }],
            "categories": null
        }"#;
        let item: RawFeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.media_thumbnail.len(), 2);
        assert!(item.categories.is_empty());
    }

    #[test]
    fn test_raw_item_heterogeneous_categories() {
        let json = r##"{
            "categories": ["Robotics", { "#text": "AI", "domain": "x" }, { "name": "Chips" }, 7, null]
        }"##;
        let item: RawFeedItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.categories.len(), 5);
        assert_eq!(item.categories[0], RawCategory::Text("Robotics".into()));
        assert!(matches!(item.categories[1], RawCategory::Fields(_)));
        assert!(matches!(item.categories[3], RawCategory::Other(_)));
    }

    #[test]
    fn test_article_serializes_camel_case() {
        let article = Article {
            title: "T".into(),
            url: "https://example.com".into(),
            summary: String::new(),
            image_url: None,
            categories: vec![],
            published_at: Some("2025-05-06T14:30:00.000Z".into()),
            source: "IEEE Spectrum — AI".into(),
        };
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"imageUrl\":null"));
        assert!(json.contains("\"publishedAt\":\"2025-05-06T14:30:00.000Z\""));
    }

    #[test]
    fn test_adapter_tagged_yaml() {
        let yaml = r#"
kind: origin_page_image
asset_base: https://cdn.example.com/assets
rules:
  - keyword: robotics
    asset: robotics.jpg
default_asset: default.png
"#;
        let adapter: Adapter = serde_yaml::from_str(yaml).unwrap();
        match adapter {
            Adapter::OriginPageImage(f) => {
                assert_eq!(f.rules.len(), 1);
                assert_eq!(f.default_asset, "default.png");
            }
            other => panic!("unexpected adapter {other:?}"),
        }

        let generic: Adapter = serde_yaml::from_str("kind: generic_media").unwrap();
        assert_eq!(generic, Adapter::GenericMedia);
    }
}
