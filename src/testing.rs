//! In-memory fakes shared by the unit tests.

use crate::events::{PipelineEvent, Reporter};
use crate::http::{FetchAsync, FetchError};
use crate::models::RawFeedItem;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Reply = Result<String, u16>;

/// Serves canned bodies and statuses per URL and counts calls.
///
/// Replies queued for a URL are consumed in order; the last one repeats.
/// Unknown URLs answer `404`.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, url: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn with_body(self, url: &str, body: &str) -> Self {
        self.push(url, Ok(body.to_string()))
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.push(url, Err(status))
    }

    pub fn then_body(self, url: &str, body: &str) -> Self {
        self.with_body(url, body)
    }

    pub fn then_status(self, url: &str, status: u16) -> Self {
        self.with_status(url, status)
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl FetchAsync for FakeFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };
        match reply.unwrap_or(Err(404)) {
            Ok(body) => Ok(body),
            Err(status) => Err(FetchError::Status {
                status,
                reason: "fake".to_string(),
            }),
        }
    }
}

/// Keeps every event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A minimal raw item with a title and link.
pub fn item(title: &str, link: &str) -> RawFeedItem {
    RawFeedItem {
        title: Some(title.to_string()),
        link: Some(link.to_string()),
        ..Default::default()
    }
}

/// Wrap items into an RSS 2.0 document.
pub fn rss(channel_title: &str, items: &[&str]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel>
<title>{channel_title}</title>
<link>https://example.com</link>
{}
</channel>
</rss>"#,
        items.join("\n")
    )
}
