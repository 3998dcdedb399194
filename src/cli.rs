//! Command-line interface definitions for the tech digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can also be provided via environment variables.

use crate::config::Settings;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for one digest run.
///
/// # Examples
///
/// ```sh
/// # Built-in feeds, snapshot written to ./data/today.yaml
/// tech_digest
///
/// # Custom registry, three items per feed, archive the snapshot
/// tech_digest -c feeds.yaml --items-per-feed 3 --archive
///
/// # Also export JSON for the web page build
/// tech_digest -d ./data -j ./public/api
///
/// # Re-render an edited today.yaml without fetching
/// tech_digest --render-only -w ./docs
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory receiving today.yaml (and archive/)
    #[arg(short, long, env = "DIGEST_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Optional feed registry YAML; the built-in registry is used otherwise
    #[arg(short, long, env = "DIGEST_FEEDS")]
    pub config: Option<PathBuf>,

    /// Optional output directory for a JSON copy of the snapshot
    #[arg(short, long)]
    pub json_output_dir: Option<PathBuf>,

    /// Optional output directory for the rendered web page and newsletter HTML
    #[arg(short = 'w', long)]
    pub html_output_dir: Option<PathBuf>,

    /// Skip fetching; render the existing snapshot in the data dir to HTML
    #[arg(long, requires = "html_output_dir")]
    pub render_only: bool,

    /// Newest items taken from each feed
    #[arg(long, env = "ITEMS_PER_FEED", default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub items_per_feed: u16,

    /// Maximum articles kept in the snapshot, after dedupe
    #[arg(long, env = "MAX_ARTICLES", default_value_t = 25)]
    pub max_articles: usize,

    /// Newsletter subject line
    #[arg(long, default_value = "Your Tech Digest")]
    pub subject: String,

    /// Newsletter intro paragraph
    #[arg(
        long,
        default_value = "Curated news on AI, robotics, chips and engineering. Feel free to tweak this intro in data/today.yaml."
    )]
    pub intro: String,

    /// Timeout in seconds applied to every feed and page request
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout_secs: u64,

    /// Retries for transient fetch failures (transport errors, 429, 5xx)
    #[arg(long, default_value_t = 1)]
    pub max_retries: usize,

    /// Also copy the snapshot to archive/<date>.yaml
    #[arg(long)]
    pub archive: bool,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            items_per_feed: usize::from(self.items_per_feed),
            max_articles: self.max_articles,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
        }
    }
}
