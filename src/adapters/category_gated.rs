//! Category-gated adapter (MIT News topic feeds).
//!
//! Feeds are already scoped by URL, so an item with no categories is kept.
//! An item that does carry categories must match the allow-list.

use super::base_article;
use crate::extract::extract_image;
use crate::models::{Article, CategoryGate, FeedMeta, FeedSource, RawFeedItem};

/// Case-insensitive substring match of any allowed topic against any category.
pub fn passes_gate(categories: &[String], allow: &[String]) -> bool {
    if categories.is_empty() {
        return true;
    }
    let allow: Vec<String> = allow.iter().map(|a| a.to_lowercase()).collect();
    categories.iter().any(|c| {
        let c = c.to_lowercase();
        allow.iter().any(|a| c.contains(a.as_str()))
    })
}

pub fn normalize(
    gate: &CategoryGate,
    item: &RawFeedItem,
    meta: &FeedMeta,
    source: &FeedSource,
) -> Option<Article> {
    let mut article = base_article(item, meta, source);
    if !passes_gate(&article.categories, &gate.allow) {
        return None;
    }
    article.image_url = extract_image(item, Some(&gate.base_url));
    Some(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Adapter, RawCategory};
    use crate::testing::item;

    fn gate() -> CategoryGate {
        CategoryGate {
            base_url: "https://news.mit.edu".into(),
            allow: vec!["Robotics".into(), "Artificial intelligence".into()],
        }
    }

    fn source() -> FeedSource {
        FeedSource::new(
            "MIT Robotics",
            "https://news.mit.edu/topic/mitrobotics-rss.xml",
            Adapter::CategoryGated(gate()),
        )
    }

    fn with_categories(categories: &[&str]) -> RawFeedItem {
        let mut raw = item("Robot learns", "https://news.mit.edu/2025/robot");
        raw.categories = categories
            .iter()
            .map(|c| RawCategory::Text(c.to_string()))
            .collect();
        raw
    }

    #[test]
    fn test_matching_category_is_kept() {
        let article = normalize(&gate(), &with_categories(&["Robotics"]), &FeedMeta::default(), &source());
        assert!(article.is_some());
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let raw = with_categories(&["Politics", "Soft robotics research"]);
        assert!(normalize(&gate(), &raw, &FeedMeta::default(), &source()).is_some());
    }

    #[test]
    fn test_non_matching_categories_are_dropped() {
        let raw = with_categories(&["Politics"]);
        assert_eq!(normalize(&gate(), &raw, &FeedMeta::default(), &source()), None);
    }

    #[test]
    fn test_no_categories_is_kept_regardless() {
        let raw = with_categories(&[]);
        assert!(normalize(&gate(), &raw, &FeedMeta::default(), &source()).is_some());
        assert!(passes_gate(&[], &[]));
    }

    #[test]
    fn test_relative_image_resolved_against_origin() {
        let mut raw = with_categories(&["Robotics"]);
        raw.content = Some(r#"<p>Robots.</p><img src="/sites/default/files/robot.jpg">"#.into());

        let article = normalize(&gate(), &raw, &FeedMeta::default(), &source()).unwrap();
        assert_eq!(
            article.image_url.as_deref(),
            Some("https://news.mit.edu/sites/default/files/robot.jpg")
        );
        assert_eq!(article.categories, vec!["Robotics"]);
    }
}
