//! YAML snapshot of the day's digest.
//!
//! The snapshot is the hand-off point to the renderers: editors may tweak the
//! intro in `today.yaml` before the newsletter goes out.

use crate::models::Newsletter;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// File name of the current snapshot inside the data dir.
pub const SNAPSHOT_FILE: &str = "today.yaml";

/// Write `newsletter` to `<data_dir>/today.yaml`, replacing any previous snapshot.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display()))]
pub async fn write_snapshot(
    newsletter: &Newsletter,
    data_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let yaml = serde_yaml::to_string(newsletter)?;

    if let Err(e) = fs::create_dir_all(data_dir).await {
        error!(error = %e, "Failed to create data dir");
        return Err(e.into());
    }

    let path = data_dir.join(SNAPSHOT_FILE);
    fs::write(&path, yaml).await?;
    info!(
        path = %path.display(),
        articles = newsletter.articles.len(),
        "Wrote snapshot"
    );
    Ok(path)
}

/// Read a snapshot back. A snapshot without articles is an error.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_snapshot(path: &Path) -> Result<Newsletter, Box<dyn Error>> {
    let yaml = fs::read_to_string(path).await?;
    let newsletter: Newsletter = serde_yaml::from_str(&yaml)?;
    if newsletter.articles.is_empty() {
        return Err(format!("{} has no articles", path.display()).into());
    }
    Ok(newsletter)
}

/// Copy `<data_dir>/today.yaml` to `<data_dir>/archive/<date>.yaml`.
///
/// Empty snapshots are not archived.
#[instrument(level = "info", skip_all, fields(data_dir = %data_dir.display(), date = %date))]
pub async fn archive_snapshot(data_dir: &Path, date: &str) -> Result<PathBuf, Box<dyn Error>> {
    let source = data_dir.join(SNAPSHOT_FILE);
    read_snapshot(&source).await?;

    let archive_dir = data_dir.join("archive");
    fs::create_dir_all(&archive_dir).await?;

    let target = archive_dir.join(format!("{date}.yaml"));
    fs::copy(&source, &target).await?;
    info!(path = %target.display(), "Archived snapshot");
    Ok(target)
}
