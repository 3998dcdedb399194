//! Source adapters: one raw feed item in, one [`Article`] (or a skip) out.
//!
//! Each feed in the registry is bound to one [`Adapter`] variant. The variants
//! differ only in extraction and filtering policy:
//!
//! | Variant | Module | Image | Filter |
//! |---------|--------|-------|--------|
//! | `GenericMedia` | [`generic`] | media field, else first `<img>` of the body | none |
//! | `CategoryGated` | [`category_gated`] | as generic, relative paths resolved against the publisher origin | topic allow-list |
//! | `OriginPageImage` | [`origin_page`] | `og:image`/`twitter:image` of the article page, else a keyword-chosen asset | none |
//!
//! Adapters never fail: every field has a fallback chain ending in `None` or
//! an empty string, and network trouble only costs the image.

pub mod category_gated;
pub mod generic;
pub mod origin_page;

use crate::events::Reporter;
use crate::extract::{extract_summary, normalize_categories, resolve_published_at};
use crate::http::FetchAsync;
use crate::models::{Adapter, Article, FeedMeta, FeedSource, RawFeedItem};
use crate::utils::{collapse_whitespace, non_empty};

/// Used when neither the registry nor the feed names the publisher.
const UNKNOWN_SOURCE: &str = "Unknown source";

/// Collaborators an adapter may call while normalizing.
pub struct Context<'a, F> {
    pub fetcher: &'a F,
    pub reporter: &'a dyn Reporter,
}

impl Adapter {
    /// Normalize one item. `None` means "skip", never an error.
    pub async fn normalize<F: FetchAsync>(
        &self,
        item: &RawFeedItem,
        meta: &FeedMeta,
        source: &FeedSource,
        ctx: &Context<'_, F>,
    ) -> Option<Article> {
        match self {
            Adapter::GenericMedia => Some(generic::normalize(item, meta, source)),
            Adapter::CategoryGated(gate) => category_gated::normalize(gate, item, meta, source),
            Adapter::OriginPageImage(fallback) => {
                Some(origin_page::normalize(fallback, item, meta, source, ctx).await)
            }
        }
    }
}

/// Fields every variant fills the same way; `image_url` is left to the variant.
pub(crate) fn base_article(item: &RawFeedItem, meta: &FeedMeta, source: &FeedSource) -> Article {
    Article {
        title: item
            .title
            .as_deref()
            .map(collapse_whitespace)
            .unwrap_or_default(),
        url: non_empty(item.link.as_deref())
            .map(str::to_string)
            .unwrap_or_default(),
        summary: extract_summary(item),
        image_url: None,
        categories: normalize_categories(&item.categories),
        published_at: resolve_published_at(item),
        source: non_empty(Some(source.name.as_str()))
            .or(non_empty(meta.title.as_deref()))
            .unwrap_or(UNKNOWN_SOURCE)
            .to_string(),
    }
}
