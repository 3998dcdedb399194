//! Filtering, ordering and duplicate elimination over the collected articles.

use crate::events::{PipelineEvent, Reporter};
use crate::models::Article;
use crate::utils::{collapse_whitespace, parse_feed_date};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Regex, RegexSet, RegexSetBuilder};
use std::collections::HashSet;

/// General-politics noise the digest does not carry.
const POLITICS_PATTERNS: &[&str] = &[
    r"\bTrump\b",
    r"\bBiden\b",
    r"\bMacron\b",
    r"\bLe Pen\b",
    r"\bvisa\b",
    r"\bH-?1B\b",
    r"\bimmigration\b",
    r"\belection\b",
    r"\bcampaign\b",
    r"\bparliament\b",
    r"\bCongress\b",
    r"\bSenate\b",
    r"\bWhite House\b",
    r"\bpolitic(s|al)?\b",
    r"\bpolicy\b",
];

static POLITICS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSetBuilder::new(POLITICS_PATTERNS)
        .case_insensitive(true)
        .build()
        .unwrap()
});

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Whether title, summary or categories mention general politics.
pub fn is_probably_political(article: &Article) -> bool {
    let categories = article.categories.iter().join(" ");
    let text = [article.title.as_str(), article.summary.as_str(), categories.as_str()].join(" ");
    POLITICS.is_match(&text)
}

/// Dedupe key: tags stripped, whitespace collapsed, lower-cased.
///
/// Idempotent, and insensitive to case, spacing and markup.
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(&TAGS.replace_all(title, "")).to_lowercase()
}

fn timestamp(article: &Article) -> Option<DateTime<Utc>> {
    article.published_at.as_deref().and_then(parse_feed_date)
}

/// Order newest first.
///
/// Articles without a usable date stay exactly where they are; the dated ones
/// are stably sorted among the remaining positions. Undated articles are
/// therefore neither pushed to the front nor to the back.
pub fn sort_newest_first(articles: &mut [Article]) {
    let slots: Vec<usize> = articles
        .iter()
        .enumerate()
        .filter(|(_, a)| timestamp(a).is_some())
        .map(|(i, _)| i)
        .collect();

    let mut dated: Vec<(DateTime<Utc>, Article)> = slots
        .iter()
        .filter_map(|&i| timestamp(&articles[i]).map(|ts| (ts, articles[i].clone())))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    for (slot, (_, article)) in slots.into_iter().zip(dated) {
        articles[slot] = article;
    }
}

/// Keep the first article per [`normalize_title`] key; drop articles whose key is empty.
///
/// Run after [`sort_newest_first`], "first" means "newest".
pub fn dedupe(articles: Vec<Article>, reporter: &dyn Reporter) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| {
            let key = normalize_title(&article.title);
            if key.is_empty() {
                return false;
            }
            if seen.insert(key) {
                return true;
            }
            reporter.report(PipelineEvent::DuplicateDropped {
                title: article.title.clone(),
                source: article.source.clone(),
            });
            false
        })
        .collect()
}
