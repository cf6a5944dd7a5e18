//! `[compile]` section configuration.
//!
//! The markup entry file references its stylesheet and script through two
//! literal placeholders which the pipeline replaces with resource
//! references.
//!
//! ```toml
//! [compile]
//! style_placeholder = 'href="styles.css"'
//! script_placeholder = 'src="script.js"'
//! ```

use serde::{Deserialize, Serialize};

use crate::workspace::template::{SCRIPT_PLACEHOLDER, STYLE_PLACEHOLDER};

/// Local pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Attribute text replaced by `href="<style resource>"`.
    pub style_placeholder: String,

    /// Attribute text replaced by `src="<script resource>"`.
    pub script_placeholder: String,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            style_placeholder: STYLE_PLACEHOLDER.to_string(),
            script_placeholder: SCRIPT_PLACEHOLDER.to_string(),
        }
    }
}
