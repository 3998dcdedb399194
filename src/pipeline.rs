//! Feed orchestration: fetch each registered feed, normalize its newest items,
//! then sort and deduplicate the union.
//!
//! Feeds are processed one after another. A feed that cannot be fetched or
//! parsed contributes nothing and the run carries on; the pipeline itself
//! never fails.

use crate::adapters::Context;
use crate::config::FeedRegistry;
use crate::events::{PipelineEvent, Reporter, SkipReason};
use crate::feed::{ParsedFeed, parse_feed};
use crate::http::FetchAsync;
use crate::models::{Article, FeedSource};
use crate::postprocess::{dedupe, is_probably_political, sort_newest_first};
use crate::utils::to_iso8601;
use futures::stream::{self, StreamExt};
use std::error::Error;
use tracing::instrument;

/// Fetch and parse one feed document.
async fn fetch_feed<F: FetchAsync>(fetcher: &F, url: &str) -> Result<ParsedFeed, Box<dyn Error>> {
    let xml = fetcher.get_text(url).await?;
    Ok(parse_feed(&xml)?)
}

/// Normalize the first `items_per_feed` items of one feed.
#[instrument(level = "info", skip_all, fields(feed = %source.name))]
async fn collect_feed<F: FetchAsync>(
    source: &FeedSource,
    fetcher: &F,
    reporter: &dyn Reporter,
    items_per_feed: usize,
) -> Vec<Article> {
    reporter.report(PipelineEvent::FeedStarted {
        feed: source.name.clone(),
        url: source.url.clone(),
    });

    let parsed = match fetch_feed(fetcher, &source.url).await {
        Ok(parsed) => parsed,
        Err(e) => {
            reporter.report(PipelineEvent::FeedFailed {
                feed: source.name.clone(),
                error: e.to_string(),
            });
            return Vec::new();
        }
    };

    let ctx = Context { fetcher, reporter };
    let skip = |title: &str, reason| {
        reporter.report(PipelineEvent::ItemSkipped {
            feed: source.name.clone(),
            title: title.to_string(),
            reason,
        })
    };

    let mut added = Vec::new();
    for item in parsed.items.iter().take(items_per_feed) {
        let Some(mut article) = source
            .adapter
            .normalize(item, &parsed.meta, source, &ctx)
            .await
        else {
            skip(item.title.as_deref().unwrap_or_default(), SkipReason::AdapterDeclined);
            continue;
        };

        article.source = source.name.clone();
        article.published_at = article.published_at.as_deref().and_then(to_iso8601);

        if is_probably_political(&article) {
            skip(&article.title, SkipReason::Political);
            continue;
        }
        if article.title.trim().is_empty() || article.url.trim().is_empty() {
            skip(&article.title, SkipReason::MissingField);
            continue;
        }

        reporter.report(PipelineEvent::ArticleAccepted {
            feed: source.name.clone(),
            title: article.title.clone(),
        });
        added.push(article);
    }

    reporter.report(PipelineEvent::FeedCompleted {
        feed: source.name.clone(),
        added: added.len(),
    });
    added
}

/// Run the whole ingestion: every feed in registry order, then newest-first
/// ordering and title dedupe. Always returns, possibly empty.
#[instrument(level = "info", skip_all, fields(feeds = registry.feeds.len(), items_per_feed = items_per_feed))]
pub async fn run<F: FetchAsync>(
    registry: &FeedRegistry,
    fetcher: &F,
    reporter: &dyn Reporter,
    items_per_feed: usize,
) -> Vec<Article> {
    let mut articles: Vec<Article> = stream::iter(&registry.feeds)
        .then(|source| collect_feed(source, fetcher, reporter, items_per_feed))
        .concat()
        .await;

    let collected = articles.len();
    sort_newest_first(&mut articles);
    let kept = dedupe(articles, reporter);

    reporter.report(PipelineEvent::RunCompleted {
        collected,
        kept: kept.len(),
        removed: collected - kept.len(),
    });
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Adapter, CategoryGate, FallbackImages};
    use crate::testing::{FakeFetcher, RecordingReporter, rss};

    fn rss_item(title: &str, link: &str, pub_date: Option<&str>) -> String {
        let date = pub_date
            .map(|d| format!("<pubDate>{d}</pubDate>"))
            .unwrap_or_default();
        format!("<item><title>{title}</title><link>{link}</link>{date}<description>&lt;p&gt;About {title}.&lt;/p&gt;</description></item>")
    }

    fn registry(feeds: Vec<FeedSource>) -> FeedRegistry {
        FeedRegistry { feeds }
    }

    #[tokio::test]
    async fn test_duplicate_across_feeds_keeps_newest() {
        let a = rss(
            "A",
            &[rss_item("Robot Hands Learn", "https://a.example/1", Some("Tue, 06 May 2025 10:00:00 GMT")).as_str()],
        );
        let b = rss(
            "B",
            &[rss_item("robot hands   learn", "https://b.example/1", Some("Wed, 07 May 2025 10:00:00 GMT")).as_str()],
        );
        let fetcher = FakeFetcher::new()
            .with_body("https://a.example/feed", &a)
            .with_body("https://b.example/feed", &b);
        let reporter = RecordingReporter::default();
        let reg = registry(vec![
            FeedSource::new("Feed A", "https://a.example/feed", Adapter::GenericMedia),
            FeedSource::new("Feed B", "https://b.example/feed", Adapter::GenericMedia),
        ]);

        let articles = run(&reg, &fetcher, &reporter, 1).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "Feed B");
        assert_eq!(articles[0].url, "https://b.example/1");
        assert_eq!(articles[0].published_at.as_deref(), Some("2025-05-07T10:00:00.000Z"));
        assert!(reporter.events().contains(&PipelineEvent::DuplicateDropped {
            title: "Robot Hands Learn".into(),
            source: "Feed A".into(),
        }));
    }

    #[tokio::test]
    async fn test_failed_feed_is_isolated() {
        let ok = rss("OK", &[rss_item("Chip news", "https://ok.example/1", None).as_str()]);
        let fetcher = FakeFetcher::new()
            .with_status("https://down.example/feed", 500)
            .with_body("https://broken.example/feed", "<rss><channel><item></channel>")
            .with_body("https://ok.example/feed", &ok);
        let reporter = RecordingReporter::default();
        let reg = registry(vec![
            FeedSource::new("Down", "https://down.example/feed", Adapter::GenericMedia),
            FeedSource::new("Broken", "https://broken.example/feed", Adapter::GenericMedia),
            FeedSource::new("OK", "https://ok.example/feed", Adapter::GenericMedia),
        ]);

        let articles = run(&reg, &fetcher, &reporter, 1).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Chip news");
        assert_eq!(articles[0].published_at, None);

        let failed: Vec<_> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::FeedFailed { feed, .. } => Some(feed),
                _ => None,
            })
            .collect();
        assert_eq!(failed, vec!["Down", "Broken"]);
    }

    #[tokio::test]
    async fn test_items_per_feed_takes_newest_n() {
        let xml = rss(
            "A",
            &[
                rss_item("First", "https://a.example/1", None).as_str(),
                rss_item("Second", "https://a.example/2", None).as_str(),
                rss_item("Third", "https://a.example/3", None).as_str(),
            ],
        );
        let fetcher = FakeFetcher::new().with_body("https://a.example/feed", &xml);
        let reporter = RecordingReporter::default();
        let reg = registry(vec![FeedSource::new("A", "https://a.example/feed", Adapter::GenericMedia)]);

        let articles = run(&reg, &fetcher, &reporter, 2).await;
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_filters_political_gated_and_incomplete_items() {
        let xml = rss(
            "MIT",
            &[
                rss_item("Congress debates new visa policy for engineers", "https://m.example/1", None).as_str(),
                "<item><title>Campus dining</title><link>https://m.example/2</link><category>Food</category></item>",
                rss_item("No link here", "", None).as_str(),
                "<item><title>Robot arm</title><link>https://m.example/4</link><category>Robotics</category></item>",
            ],
        );
        let fetcher = FakeFetcher::new().with_body("https://m.example/feed", &xml);
        let reporter = RecordingReporter::default();
        let reg = registry(vec![FeedSource::new(
            "MIT Robotics",
            "https://m.example/feed",
            Adapter::CategoryGated(CategoryGate {
                base_url: "https://m.example".into(),
                allow: vec!["Robotics".into()],
            }),
        )]);

        let articles = run(&reg, &fetcher, &reporter, 10).await;
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Robot arm");
        assert_eq!(articles[0].categories, vec!["Robotics"]);

        let reasons: Vec<_> = reporter
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::ItemSkipped { reason, .. } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(
            reasons,
            vec![SkipReason::Political, SkipReason::AdapterDeclined, SkipReason::MissingField]
        );
    }

    #[tokio::test]
    async fn test_origin_page_feed_fetches_article_page() {
        let xml = rss("TX", &[rss_item("Gripper", "https://tx.example/gripper", Some("Tue, 06 May 2025 10:00:00 GMT")).as_str()]);
        let fetcher = FakeFetcher::new()
            .with_body("https://tx.example/feed", &xml)
            .with_body(
                "https://tx.example/gripper",
                r#"<meta property="og:image" content="https://tx.example/og.jpg">"#,
            );
        let reporter = RecordingReporter::default();
        let reg = registry(vec![FeedSource::new(
            "TechXplore — Robotics",
            "https://tx.example/feed",
            Adapter::OriginPageImage(FallbackImages {
                asset_base: "https://cdn.example.com".into(),
                rules: vec![],
                default_asset: "default.png".into(),
            }),
        )]);

        let articles = run(&reg, &fetcher, &reporter, 1).await;
        assert_eq!(articles[0].image_url.as_deref(), Some("https://tx.example/og.jpg"));
        assert_eq!(articles[0].summary, "About Gripper.");
    }

    #[tokio::test]
    async fn test_empty_registry_yields_empty_run() {
        let fetcher = FakeFetcher::new();
        let reporter = RecordingReporter::default();
        let articles = run(&registry(vec![]), &fetcher, &reporter, 1).await;
        assert!(articles.is_empty());
        assert_eq!(
            reporter.events(),
            vec![PipelineEvent::RunCompleted {
                collected: 0,
                kept: 0,
                removed: 0
            }]
        );
    }
}
