//! Utility functions for date normalization, string cleanup and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - ISO-8601 conversion of the many date spellings feeds use
//! - Whitespace collapsing and string truncation for logging
//! - File system validation for output directories

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Naive layouts seen in the wild that are neither RFC 2822 nor RFC 3339.
/// Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Leading weekday, abbreviated or spelled out (`Tue, `, `Tuesday, `).
static LEADING_WEEKDAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+,\s*").unwrap());

/// Trailing zone names RFC 2822 parsing does not accept.
static UTC_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(UTC|Z)$").unwrap());

/// Layouts with a numeric offset that is not RFC 3339 shaped (`+0000`).
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

fn parse_strict(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a feed date into a UTC timestamp.
///
/// Accepts RFC 2822 (`pubDate`), RFC 3339 (`isoDate`, Atom `published`/`updated`),
/// a few naive layouts and bare dates. A value that fails as is gets a second
/// try with its weekday dropped and a `UTC`/`Z` zone rewritten to `+0000`, so
/// a wrong or spelled-out weekday does not lose the date. Returns `None` for
/// anything else.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_strict(raw).or_else(|| {
        let relaxed = LEADING_WEEKDAY.replace(raw, "");
        let relaxed = UTC_SUFFIX.replace(&relaxed, " +0000");
        parse_strict(relaxed.trim())
    })
}

/// Convert a feed date to the canonical ISO-8601 form (`2025-05-06T14:30:00.000Z`).
///
/// Idempotent: converting an already converted value yields the same string.
pub fn to_iso8601(raw: &str) -> Option<String> {
    parse_feed_date(raw).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Collapse runs of whitespace into a single space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

/// Treat empty or whitespace-only strings as absent.
pub fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary before `max` bytes,
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Today's date in UTC as `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().date_naive().to_string()
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 5);
        assert!(result.starts_with("éé…"));
    }

    #[test]
    fn test_to_iso8601_rfc2822() {
        assert_eq!(
            to_iso8601("Tue, 06 May 2025 14:30:00 GMT").as_deref(),
            Some("2025-05-06T14:30:00.000Z")
        );
        assert_eq!(
            to_iso8601("Tue, 06 May 2025 10:30:00 -0400").as_deref(),
            Some("2025-05-06T14:30:00.000Z")
        );
    }

    #[test]
    fn test_to_iso8601_rfc3339_and_naive() {
        assert_eq!(
            to_iso8601("2025-05-06T16:30:00+02:00").as_deref(),
            Some("2025-05-06T14:30:00.000Z")
        );
        assert_eq!(
            to_iso8601("2025-05-06 14:30:00").as_deref(),
            Some("2025-05-06T14:30:00.000Z")
        );
        assert_eq!(
            to_iso8601("2025-05-06").as_deref(),
            Some("2025-05-06T00:00:00.000Z")
        );
    }

    #[test]
    fn test_to_iso8601_lenient_spellings() {
        let expected = Some("2025-05-06T14:30:00.000Z");
        assert_eq!(to_iso8601("Tue, 06 May 2025 14:30:00 UTC").as_deref(), expected);
        assert_eq!(to_iso8601("06 May 2025 14:30:00 Z").as_deref(), expected);
        assert_eq!(to_iso8601("2025-05-06T14:30:00+0000").as_deref(), expected);
        assert_eq!(to_iso8601("2025-05-06T16:30:00.000+0200").as_deref(), expected);
        // Wrong weekday (6 May 2025 was a Tuesday)
        assert_eq!(to_iso8601("Mon, 06 May 2025 14:30:00 GMT").as_deref(), expected);
        assert_eq!(to_iso8601("Tuesday, 06 May 2025 14:30:00 GMT").as_deref(), expected);
    }

    #[test]
    fn test_to_iso8601_still_parses_plain_rfc2822_variants() {
        assert_eq!(
            to_iso8601("Tue, 06 May 2025 07:30:00 PDT").as_deref(),
            Some("2025-05-06T14:30:00.000Z")
        );
        assert_eq!(
            to_iso8601("Tue, 6 May 2025 14:30:00 GMT").as_deref(),
            Some("2025-05-06T14:30:00.000Z")
        );
        assert_eq!(
            to_iso8601("06 May 2025 14:30:00 GMT").as_deref(),
            Some("2025-05-06T14:30:00.000Z")
        );
    }

    #[test]
    fn test_to_iso8601_is_idempotent() {
        let once = to_iso8601("Tue, 06 May 2025 14:30:00 GMT").unwrap();
        assert_eq!(to_iso8601(&once).as_deref(), Some(once.as_str()));
    }

    #[test]
    fn test_to_iso8601_rejects_garbage() {
        assert_eq!(to_iso8601(""), None);
        assert_eq!(to_iso8601("   "), None);
        assert_eq!(to_iso8601("yesterday-ish"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  x ")), Some("x"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
