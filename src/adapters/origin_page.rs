//! Origin-page-image adapter (WIRED, TechXplore, ScienceDaily).
//!
//! These feeds carry no usable images, so the feed's own image fields are
//! ignored. The article page is fetched for its social-preview image; when that
//! fails a placeholder asset is picked from keywords in the feed name.

use super::{Context, base_article};
use crate::extract::absolutize;
use crate::http::FetchAsync;
use crate::models::{Article, FallbackImages, FeedMeta, FeedSource, RawFeedItem};
use crate::og_image::resolve_og_image;
use crate::utils::non_empty;
use regex::RegexBuilder;

fn matches_keyword(feed_name: &str, keyword: &str) -> bool {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return false;
    }
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword)))
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(feed_name))
        .unwrap_or(false)
}

/// Deterministic placeholder for a feed: first rule whose keyword appears as a
/// word in `feed_name`, else the default asset.
pub fn fallback_image(fallback: &FallbackImages, feed_name: &str) -> Option<String> {
    let asset = fallback
        .rules
        .iter()
        .find(|rule| matches_keyword(feed_name, &rule.keyword))
        .map(|rule| rule.asset.as_str())
        .unwrap_or(fallback.default_asset.as_str());
    let url = format!(
        "{}/{}",
        fallback.asset_base.trim_end_matches('/'),
        asset.trim_start_matches('/')
    );
    absolutize(&url, None)
}

pub async fn normalize<F: FetchAsync>(
    fallback: &FallbackImages,
    item: &RawFeedItem,
    meta: &FeedMeta,
    source: &FeedSource,
    ctx: &Context<'_, F>,
) -> Article {
    let mut article = base_article(item, meta, source);
    let from_page = match non_empty(item.link.as_deref()) {
        Some(link) => resolve_og_image(ctx.fetcher, ctx.reporter, link).await,
        None => None,
    };
    article.image_url = from_page.or_else(|| fallback_image(fallback, &source.name));
    article
}
