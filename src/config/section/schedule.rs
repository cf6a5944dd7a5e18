//! `[schedule]` section configuration.
//!
//! ```toml
//! [schedule]
//! debounce_ms = 500   # Quiet period after the last edit before recompiling
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Recompilation scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Trailing debounce window for edit-triggered recompilation.
    pub debounce_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl ScheduleConfig {
    #[inline]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
