//! Social-preview image lookup on an article's own page.
//!
//! Some publishers never put images in their feeds. For those we GET the
//! article page and read the Open Graph (`og:image`) or Twitter card
//! (`twitter:image`) meta tag. Every failure ends as `None` plus a reported event.

use crate::events::{PipelineEvent, Reporter};
use crate::extract::absolutize;
use crate::http::FetchAsync;
use crate::utils::truncate_for_log;
use scraper::{Html, Selector};
use std::time::Instant;
use tracing::instrument;

/// Meta tags consulted, in order.
const IMAGE_META_SELECTORS: &[&str] = &[
    r#"meta[property="og:image"]"#,
    r#"meta[name="twitter:image"]"#,
];

/// Pull the preview image out of a page's HTML, resolved against `page_url`.
pub fn find_preview_image(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    IMAGE_META_SELECTORS.iter().find_map(|sel| {
        let selector = Selector::parse(sel).unwrap();
        document
            .select(&selector)
            .filter_map(|meta| meta.value().attr("content"))
            .find_map(|content| absolutize(content, Some(page_url)))
    })
}

/// Fetch `page_url` and return its `og:image`, else `twitter:image`, else `None`.
#[instrument(level = "debug", skip(fetcher, reporter))]
pub async fn resolve_og_image<F: FetchAsync>(
    fetcher: &F,
    reporter: &dyn Reporter,
    page_url: &str,
) -> Option<String> {
    let t0 = Instant::now();
    let html = match fetcher.get_text(page_url).await {
        Ok(html) => html,
        Err(e) => {
            reporter.report(PipelineEvent::ImageFetchFailed {
                url: page_url.to_string(),
                status: e.status(),
                elapsed_ms: t0.elapsed().as_millis(),
                error: e.to_string(),
            });
            return None;
        }
    };

    let image = find_preview_image(&html, page_url);
    if image.is_none() {
        reporter.report(PipelineEvent::ImageMetaMissing {
            url: page_url.to_string(),
            head: truncate_for_log(&html.replace('\n', " "), 400),
        });
    }
    image
}
