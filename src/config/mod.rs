//! Project configuration management for `codepad.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[remote]`   | Remote execution service, polling, rerun policy  |
//! | `[schedule]` | Debounce window for edit-triggered recompiles    |
//! | `[compile]`  | Placeholders substituted in the markup entry     |
//! | `[output]`   | Output directory for the rendered document       |
//!
//! The config is loaded once and passed around as `Arc<CodepadConfig>`;
//! there is no global config handle.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{CompileConfig, OutputConfig, RemoteConfig, RerunPolicy, ScheduleConfig};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::log;
use crate::remote::is_module_name;

/// Default config file name, searched in the project root.
pub const CONFIG_FILE: &str = "codepad.toml";

/// Root configuration structure representing codepad.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodepadConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub compile: CompileConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl CodepadConfig {
    /// Load configuration for the project at `root`.
    ///
    /// `config` is resolved against `root` when relative. A missing file
    /// yields the defaults.
    pub fn load(root: &Path, config: &Path) -> Result<Self> {
        let config_path = if config.is_absolute() {
            config.to_path_buf()
        } else {
            root.join(config)
        };

        let mut loaded = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            crate::debug!("config"; "{} not found, using defaults", config_path.display());
            Self::default()
        };

        loaded.config_path = config_path;
        loaded.root = root.to_path_buf();
        loaded.validate()?;
        Ok(loaded)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("config"; "ignoring unknown fields in {}: {}", path.display(), ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.max_attempts == 0 {
            return Err(ConfigError::validation(
                "remote.max_attempts",
                "must be at least 1",
            ));
        }
        if self.remote.poll_interval_ms == 0 {
            return Err(ConfigError::validation(
                "remote.poll_interval_ms",
                "must be greater than 0",
            ));
        }
        if self.remote.endpoint.trim().is_empty() {
            return Err(ConfigError::validation("remote.endpoint", "must not be empty"));
        }
        if let Some(bad) = self.remote.modules.iter().find(|m| !is_module_name(m)) {
            return Err(ConfigError::validation(
                "remote.modules",
                format!("`{bad}` is not a module name"),
            ));
        }
        if self.compile.style_placeholder.is_empty() || self.compile.script_placeholder.is_empty()
        {
            return Err(ConfigError::validation(
                "compile",
                "placeholders must not be empty",
            ));
        }
        Ok(())
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> CodepadConfig {
    let (parsed, ignored) = CodepadConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = CodepadConfig::load(temp.path(), Path::new(CONFIG_FILE)).unwrap();

        assert_eq!(config.root, temp.path());
        assert_eq!(config.config_path, temp.path().join(CONFIG_FILE));
        assert_eq!(config.schedule.debounce_ms, 500);
        assert_eq!(config.output_dir(), temp.path().join("public"));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "[schedule]\ndebounce_ms = 250\n[output]\ndir = \"dist\"\n",
        )
        .unwrap();

        let config = CodepadConfig::load(temp.path(), Path::new(CONFIG_FILE)).unwrap();
        assert_eq!(config.schedule.debounce_ms, 250);
        assert_eq!(config.output_dir(), temp.path().join("dist"));
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) =
            CodepadConfig::parse_with_ignored("[schedule]\ndebounce = 3\n").unwrap();
        assert_eq!(ignored, vec!["schedule.debounce".to_string()]);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = test_parse_config("[remote]\nmax_attempts = 0");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation {
                field: "remote.max_attempts",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_placeholder() {
        let config = test_parse_config("[compile]\nscript_placeholder = \"\"");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_module_name() {
        let config = test_parse_config("[remote]\nmodules = [\"os; import shutil\"]");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation {
                field: "remote.modules",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            CodepadConfig::from_str("[remote\n"),
            Err(ConfigError::Toml(_))
        ));
    }
}
