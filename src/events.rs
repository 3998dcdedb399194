//! Structured pipeline diagnostics.
//!
//! Components never log on their own account; they hand a [`PipelineEvent`] to
//! the [`Reporter`] they were given. The default [`TracingReporter`] turns each
//! event into a `tracing` event carrying an `event_kind` field, e.g.
//!
//! ```text
//! INFO tech_digest::events: Feed contributed articles event_kind="feed.completed" feed="WIRED (AI)" added=1
//! ```
//!
//! Tests swap in a recording reporter and assert on the events themselves.

use tracing::{debug, info, warn};

/// Why an item did not become an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The adapter declined the item (e.g. off-topic categories).
    AdapterDeclined,
    /// Matched one of the political-noise patterns.
    Political,
    /// No title or no URL after normalization.
    MissingField,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AdapterDeclined => "adapter_declined",
            SkipReason::Political => "political",
            SkipReason::MissingField => "missing_field",
        }
    }
}

/// Everything worth knowing about one run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    FeedStarted {
        feed: String,
        url: String,
    },
    FeedFailed {
        feed: String,
        error: String,
    },
    FeedCompleted {
        feed: String,
        added: usize,
    },
    ArticleAccepted {
        feed: String,
        title: String,
    },
    ItemSkipped {
        feed: String,
        title: String,
        reason: SkipReason,
    },
    ImageFetchFailed {
        url: String,
        status: Option<u16>,
        elapsed_ms: u128,
        error: String,
    },
    ImageMetaMissing {
        url: String,
        head: String,
    },
    DuplicateDropped {
        title: String,
        source: String,
    },
    RunCompleted {
        collected: usize,
        kept: usize,
        removed: usize,
    },
}

/// Sink for [`PipelineEvent`]s.
pub trait Reporter {
    fn report(&self, event: PipelineEvent);
}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::FeedStarted { feed, url } => {
                info!(event_kind = "feed.started", %feed, %url, "Fetching feed");
            }
            PipelineEvent::FeedFailed { feed, error } => {
                warn!(event_kind = "feed.failed", %feed, %error, "Failed to fetch feed; skipping");
            }
            PipelineEvent::FeedCompleted { feed, added } => {
                info!(event_kind = "feed.completed", %feed, added, "Feed contributed articles");
            }
            PipelineEvent::ArticleAccepted { feed, title } => {
                debug!(event_kind = "article.accepted", %feed, %title, "Article added");
            }
            PipelineEvent::ItemSkipped {
                feed,
                title,
                reason,
            } => {
                debug!(
                    event_kind = "article.skipped",
                    %feed,
                    %title,
                    reason = reason.as_str(),
                    "Item skipped"
                );
            }
            PipelineEvent::ImageFetchFailed {
                url,
                status,
                elapsed_ms,
                error,
            } => {
                warn!(
                    event_kind = "image.fetch_failed",
                    %url,
                    ?status,
                    elapsed_ms,
                    %error,
                    "og:image fetch failed"
                );
            }
            PipelineEvent::ImageMetaMissing { url, head } => {
                warn!(
                    event_kind = "image.meta_missing",
                    %url,
                    %head,
                    "No og:image or twitter:image in fetched page"
                );
            }
            PipelineEvent::DuplicateDropped { title, source } => {
                info!(event_kind = "article.duplicate", %title, %source, "Dropped duplicate");
            }
            PipelineEvent::RunCompleted {
                collected,
                kept,
                removed,
            } => {
                info!(
                    event_kind = "run.completed",
                    collected,
                    kept,
                    removed,
                    "Sorted and deduplicated articles"
                );
            }
        }
    }
}
