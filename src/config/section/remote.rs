//! `[remote]` section configuration.
//!
//! Settings for the remote execution service.
//!
//! # Example
//!
//! ```toml
//! [remote]
//! endpoint = "https://api.paiza.io"   # Service base URL
//! api_key = "guest"                   # Defaults to $PAIZA_API_KEY, then "guest"
//! language = "php"                    # Fallback when the file extension says nothing
//! poll_interval_ms = 1000             # Delay between status requests
//! max_attempts = 10                   # Status requests before giving up
//! rerun = "reject"                    # "reject" or "cancel" an outstanding run
//! modules = ["numpy", "pyfiglet"]     # Python modules imported before each run
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::remote::Language;

/// Environment variable consulted for the default API key.
pub const API_KEY_ENV: &str = "PAIZA_API_KEY";

/// What a rerun does while the previous run of the same file is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerunPolicy {
    /// Refuse the new run
    #[default]
    Reject,
    /// Cancel the outstanding run and start the new one
    Cancel,
}

/// Remote execution service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the paiza-compatible runner API.
    pub endpoint: String,

    /// API key sent with every request.
    pub api_key: String,

    /// Language used for server scripts whose extension is not recognized.
    pub language: Language,

    /// Fixed delay before each status request.
    pub poll_interval_ms: u64,

    /// Status requests issued before the job counts as timed out.
    pub max_attempts: u32,

    /// Behavior of a rerun while a job is outstanding.
    pub rerun: RerunPolicy,

    /// Python modules imported ahead of user code. Modules the sandbox
    /// does not ship are installed with pip first.
    pub modules: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.paiza.io".to_string(),
            api_key: std::env::var(API_KEY_ENV).unwrap_or_else(|_| "guest".to_string()),
            language: Language::Php,
            poll_interval_ms: 1000,
            max_attempts: 10,
            rerun: RerunPolicy::Reject,
            modules: Vec::new(),
        }
    }
}

impl RemoteConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_remote_config() {
        let config = test_parse_config(
            "[remote]\nendpoint = \"http://localhost:9000\"\nlanguage = \"python3\"\nmax_attempts = 3\nrerun = \"cancel\"",
        );

        assert_eq!(config.remote.endpoint, "http://localhost:9000");
        assert_eq!(config.remote.language, Language::Python);
        assert_eq!(config.remote.max_attempts, 3);
        assert_eq!(config.remote.rerun, RerunPolicy::Cancel);
        // Untouched fields keep defaults
        assert_eq!(config.remote.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_remote_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.remote.language, Language::Php);
        assert_eq!(config.remote.max_attempts, 10);
        assert_eq!(config.remote.rerun, RerunPolicy::Reject);
        assert!(config.remote.modules.is_empty());
    }

    #[test]
    fn test_remote_modules() {
        let config = test_parse_config("[remote]\nmodules = [\"numpy\", \"bs4\"]");
        assert_eq!(config.remote.modules, vec!["numpy", "bs4"]);
    }
}
