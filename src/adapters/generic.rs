//! Generic-media adapter, used by most publishers (IEEE Spectrum and friends).

use super::base_article;
use crate::extract::extract_image;
use crate::models::{Article, FeedMeta, FeedSource, RawFeedItem};
use crate::utils::non_empty;

/// Relative image paths are resolved against the item link, else the feed's site link.
pub fn normalize(item: &RawFeedItem, meta: &FeedMeta, source: &FeedSource) -> Article {
    let base = non_empty(item.link.as_deref()).or(non_empty(meta.link.as_deref()));
    let mut article = base_article(item, meta, source);
    article.image_url = extract_image(item, base);
    article
}
