//! # Tech Digest
//!
//! A feed ingestion and normalization pipeline that pulls the newest items
//! from a registry of technology publishers, normalizes them into one article
//! shape, filters general-politics noise, and writes a daily YAML snapshot for
//! the newsletter renderers.
//!
//! ## Features
//!
//! - RSS 2.0, RSS 1.0 (RDF) and Atom feeds
//! - Per-publisher adapters: generic media extraction, category-gated feeds,
//!   and feeds whose images live on the article page (`og:image`)
//! - Newest-first ordering and title-based duplicate elimination
//! - Outputs `today.yaml`, an optional dated archive copy, a JSON export and
//!   HTML renderings (web page and email newsletter body)
//!
//! ## Usage
//!
//! ```sh
//! tech_digest -d ./data --items-per-feed 2 --archive
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Download each feed in registry order (one shared client)
//! 2. **Normalizing**: Run the feed's adapter over its newest items
//! 3. **Post-processing**: Sort newest first, drop duplicate titles
//! 4. **Output**: Write the snapshot, optional copies and HTML renderings

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod adapters;
mod cli;
mod config;
mod events;
mod extract;
mod feed;
mod http;
mod models;
mod og_image;
mod outputs;
mod pipeline;
mod postprocess;
#[cfg(test)]
mod testing;
mod utils;

use cli::Cli;
use config::FeedRegistry;
use events::TracingReporter;
use http::{HttpFetcher, RetryFetch};
use models::Newsletter;
use outputs::{html, json, yaml};
use utils::{ensure_writable_dir, today};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "tech_digest starting up");

    let args = Cli::parse();
    let settings = args.settings();
    debug!(?args.data_dir, ?args.config, ?settings, "Parsed CLI arguments");

    // An edited today.yaml is rendered as is; no feed is fetched
    if args.render_only {
        let snapshot = args.data_dir.join(yaml::SNAPSHOT_FILE);
        let newsletter = yaml::read_snapshot(&snapshot).await?;
        if let Some(dir) = &args.html_output_dir {
            html::write_html(&newsletter, dir).await?;
        }
        info!(articles = newsletter.articles.len(), date = %newsletter.date, "Rendered snapshot");
        return Ok(());
    }

    let registry = match &args.config {
        Some(path) => FeedRegistry::load(path)?,
        None => FeedRegistry::builtin(),
    };
    info!(feeds = registry.feeds.len(), "Feed registry ready");

    // Early check: a run that cannot write its snapshot is wasted traffic
    if let Err(e) = ensure_writable_dir(&args.data_dir).await {
        error!(
            path = %args.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = RetryFetch::new(
        HttpFetcher::new(settings.timeout)?,
        settings.max_retries,
        Duration::from_millis(500),
    );

    let mut articles =
        pipeline::run(&registry, &fetcher, &TracingReporter, settings.items_per_feed).await;
    if articles.len() > settings.max_articles {
        info!(
            collected = articles.len(),
            max_articles = settings.max_articles,
            "Capping snapshot"
        );
        articles.truncate(settings.max_articles);
    }

    let newsletter = Newsletter {
        date: today(),
        subject: args.subject.clone(),
        intro: args.intro.clone(),
        articles,
    };

    yaml::write_snapshot(&newsletter, &args.data_dir).await?;

    if args.archive {
        if let Err(e) = yaml::archive_snapshot(&args.data_dir, &newsletter.date).await {
            error!(error = %e, "Failed to archive snapshot");
        }
    }

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_newsletter(&newsletter, dir).await {
            error!(error = %e, "Failed to write JSON export");
        }
    }

    if let Some(dir) = &args.html_output_dir {
        if let Err(e) = html::write_html(&newsletter, dir).await {
            error!(error = %e, "Failed to render HTML");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = newsletter.articles.len(),
        date = %newsletter.date,
        "Execution complete"
    );

    Ok(())
}
