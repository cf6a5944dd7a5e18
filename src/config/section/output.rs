//! `[output]` section configuration.
//!
//! ```toml
//! [output]
//! dir = "public"   # Where the rendered document and resources go
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Rendering output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, relative to the project root.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public"),
        }
    }
}
