//! Feed registry and run settings.
//!
//! The registry is a plain value handed to [`crate::pipeline::run`]. It comes
//! from a YAML file when one is given, otherwise from [`FeedRegistry::builtin`].
//!
//! ```yaml
//! feeds:
//!   - name: IEEE Spectrum — AI
//!     url: https://spectrum.ieee.org/rss/artificial-intelligence/fulltext
//!     adapter:
//!       kind: generic_media
//! ```

use crate::models::{Adapter, CategoryGate, FallbackImages, FeedSource, KeywordAsset};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid registry YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid registry: {0}")]
    Invalid(String),
}

/// Ordered list of configured feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRegistry {
    pub feeds: Vec<FeedSource>,
}

const MIT_ALLOWED_TOPICS: &[&str] = &[
    "Robotics",
    "Artificial intelligence",
    "Engineering",
    "Computer science",
    "Nanotechnology",
    "Materials science",
    "Mechanical engineering",
    "Technology",
];

const ASSET_BASE: &str = "https://jfetnews.net/assets";

fn mit(name: &str, url: &str) -> FeedSource {
    FeedSource::new(
        name,
        url,
        Adapter::CategoryGated(CategoryGate {
            base_url: "https://news.mit.edu".to_string(),
            allow: MIT_ALLOWED_TOPICS.iter().map(|s| s.to_string()).collect(),
        }),
    )
}

/// Placeholder assets for one publisher's origin-page feeds.
fn assets(rules: &[(&str, &str)], default_asset: &str) -> FallbackImages {
    FallbackImages {
        asset_base: ASSET_BASE.to_string(),
        rules: rules
            .iter()
            .map(|(keyword, asset)| KeywordAsset {
                keyword: keyword.to_string(),
                asset: asset.to_string(),
            })
            .collect(),
        default_asset: default_asset.to_string(),
    }
}

fn techxplore_assets() -> FallbackImages {
    assets(
        &[
            ("robotics", "techxplore_robotics.jpg"),
            ("engineering", "techxplore_robotics.jpg"),
            ("computer science", "techxplore_cs.jpg"),
            ("artificial intelligence", "techxplore_cs.jpg"),
            ("ai", "techxplore_cs.jpg"),
        ],
        "techxplore_default.png",
    )
}

fn wired_assets() -> FallbackImages {
    assets(&[], "wired_default.png")
}

fn sciencedaily_assets() -> FallbackImages {
    assets(&[], "sciencedaily_default.png")
}

fn origin_page(name: &str, url: &str, fallback: FallbackImages) -> FeedSource {
    FeedSource::new(name, url, Adapter::OriginPageImage(fallback))
}

fn generic(name: &str, url: &str) -> FeedSource {
    FeedSource::new(name, url, Adapter::GenericMedia)
}

impl FeedRegistry {
    /// The digest's default publishers.
    pub fn builtin() -> Self {
        Self {
            feeds: vec![
                mit("MIT Robotics", "https://news.mit.edu/topic/mitrobotics-rss.xml"),
                mit(
                    "MIT Artificial Intelligence",
                    "https://news.mit.edu/topic/mitartificial-intelligence2-rss.xml",
                ),
                mit("MIT Engineering", "https://news.mit.edu/rss/topic/mechanical-engineering"),
                origin_page(
                    "WIRED (AI)",
                    "https://www.wired.com/feed/tag/ai/latest/rss",
                    wired_assets(),
                ),
                origin_page(
                    "WIRED science",
                    "https://www.wired.com/feed/category/science/latest/rss",
                    wired_assets(),
                ),
                origin_page(
                    "TechXplore — Computer Science",
                    "https://techxplore.com/rss-feed/computer-sciences-news/",
                    techxplore_assets(),
                ),
                origin_page(
                    "TechXplore — Engineering",
                    "https://techxplore.com/rss-feed/engineering-news/",
                    techxplore_assets(),
                ),
                origin_page(
                    "TechXplore — Robotics",
                    "https://techxplore.com/rss-feed/robotics-news/",
                    techxplore_assets(),
                ),
                origin_page(
                    "TechXplore — AI & Machine Learning",
                    "https://techxplore.com/rss-feed/machine-learning-ai-news/",
                    techxplore_assets(),
                ),
                origin_page(
                    "ScienceDaily — Robotics",
                    "https://www.sciencedaily.com/rss/computers_math/robotics.xml",
                    sciencedaily_assets(),
                ),
                origin_page(
                    "ScienceDaily — Engineering",
                    "https://www.sciencedaily.com/rss/matter_energy/engineering.xml",
                    sciencedaily_assets(),
                ),
                origin_page(
                    "ScienceDaily — Computer Science",
                    "https://www.sciencedaily.com/rss/computers_math/computer_science.xml",
                    sciencedaily_assets(),
                ),
                origin_page(
                    "ScienceDaily — Artificial Intelligence",
                    "https://www.sciencedaily.com/rss/computers_math/artificial_intelligence.xml",
                    sciencedaily_assets(),
                ),
                generic(
                    "IEEE Spectrum — Robotics",
                    "https://spectrum.ieee.org/rss/robotics/fulltext",
                ),
                generic(
                    "IEEE Spectrum — AI",
                    "https://spectrum.ieee.org/rss/artificial-intelligence/fulltext",
                ),
                generic(
                    "IEEE Spectrum — Computing & Chips",
                    "https://spectrum.ieee.org/rss/computing/fulltext",
                ),
                generic(
                    "IEEE Spectrum — Automaton (Robotics blog)",
                    "https://spectrum.ieee.org/feeds/topic/robotics.rss",
                ),
                generic("IEEE Spectrum — DIY", "https://spectrum.ieee.org/feeds/topic/diy.rss"),
            ],
        }
    }

    /// Parse and validate a registry document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let registry: FeedRegistry = serde_yaml::from_str(yaml)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Load a registry file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_yaml(&yaml)?;
        info!(feeds = registry.feeds.len(), "Loaded feed registry");
        Ok(registry)
    }

    /// Non-empty, unique names and absolute http(s) URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feeds.is_empty() {
            return Err(ConfigError::Invalid("no feeds configured".to_string()));
        }
        let mut names = HashSet::new();
        for feed in &self.feeds {
            let name = feed.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid(format!("feed {} has no name", feed.url)));
            }
            if !names.insert(name) {
                return Err(ConfigError::Invalid(format!("duplicate feed name {name:?}")));
            }
            let ok = Url::parse(&feed.url)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !ok {
                return Err(ConfigError::Invalid(format!(
                    "feed {name:?} has invalid URL {:?}",
                    feed.url
                )));
            }
        }
        Ok(())
    }
}

/// Knobs of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Newest items taken from each feed.
    pub items_per_feed: usize,
    /// Cap on the snapshot, applied after dedupe.
    pub max_articles: usize,
    /// Timeout applied to every outbound request.
    pub timeout: Duration,
    /// Retries for transient fetch failures.
    pub max_retries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            items_per_feed: 1,
            max_articles: 25,
            timeout: Duration::from_secs(15),
            max_retries: 1,
        }
    }
}
