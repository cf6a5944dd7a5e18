//! Project loading shared by `build` and `watch`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::ProjectArgs;
use crate::config::CodepadConfig;
use crate::log;
use crate::workspace::Workspace;
use crate::workspace::project::load_project;

/// Directory under the output dir holding resource files.
pub const RESOURCE_DIR: &str = "res";

/// A loaded project: its configuration and the workspace read from disk.
pub struct Project {
    pub config: Arc<CodepadConfig>,
    pub workspace: Workspace,
}

impl Project {
    /// Paths never read into (or mirrored back into) the workspace.
    pub fn skipped(config: &CodepadConfig) -> Vec<PathBuf> {
        vec![config.output_dir(), config.config_path.clone()]
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }
}

/// Load config and files for the project directory in `args`.
///
/// An empty project starts from the starter markup/style/script.
pub fn open_project(args: &ProjectArgs, config: &Path, debounce: Option<u64>) -> Result<Project> {
    let root = args
        .dir
        .canonicalize()
        .with_context(|| format!("project directory `{}` not found", args.dir.display()))?;

    let mut config = CodepadConfig::load(&root, config)?;
    if let Some(output) = &args.output {
        config.output.dir = output.clone();
    }
    if let Some(ms) = debounce {
        config.schedule.debounce_ms = ms;
    }

    let mut workspace = load_project(&root, &Project::skipped(&config))?;
    if workspace.is_empty() {
        log!("project"; "no files in {}, using starter files", root.display());
        workspace = Workspace::starter();
    }

    Ok(Project {
        config: Arc::new(config),
        workspace,
    })
}
