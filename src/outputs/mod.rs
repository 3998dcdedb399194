//! Snapshot writers for the pipeline's result.
//!
//! # Submodules
//!
//! - [`yaml`]: Writes the daily `today.yaml` snapshot the newsletter and web page are built from
//! - [`json`]: Writes the same document as JSON for API consumers
//! - [`html`]: Renders the web page and the email newsletter body
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── today.yaml
//! └── archive/
//!     └── 2025-05-06.yaml
//!
//! json_output_dir/
//! └── 2025-05-06.json
//!
//! html_output_dir/
//! ├── index.html
//! └── newsletter.html
//! ```

pub mod html;
pub mod json;
pub mod yaml;
