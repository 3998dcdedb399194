//! JSON export of the daily snapshot.
//!
//! Files are organized by date:
//! ```text
//! json_output_dir/
//! └── 2025-05-06.json
//! ```

use crate::models::Newsletter;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `newsletter` to `{json_output_dir}/{date}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_newsletter(
    newsletter: &Newsletter,
    json_output_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(newsletter)?;

    info!("Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = json_output_dir.join(format!("{}.json", newsletter.date));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON file");
    Ok(path)
}
