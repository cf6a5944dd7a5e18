//! `codepad build`: one local compilation into the output directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::common::{Project, RESOURCE_DIR};
use crate::compiler::{CompiledArtifact, DirStore, assemble};
use crate::log;
use crate::surface::FileSurface;

/// Assemble the workspace and write `index.html` plus its resources.
///
/// Resources stay on disk: the written document keeps referencing them.
pub fn build_project(project: &Project) -> Result<PathBuf> {
    let config = &project.config;
    let output = config.output_dir();
    let resources = output.join(RESOURCE_DIR);

    if resources.exists() {
        fs::remove_dir_all(&resources)
            .with_context(|| format!("failed to clean `{}`", resources.display()))?;
    }

    let mut store = DirStore::new(&resources, RESOURCE_DIR);
    let mut surface = FileSurface::new(&output);

    let document = assemble(&project.workspace, &mut store, &config.compile)?;
    let count = document.resources.len();
    CompiledArtifact::Document(document)
        .render(&mut surface)
        .with_context(|| format!("failed to write `{}`", surface.path().display()))?;

    if let Some(info) = project.workspace.preview_info()
        && !info.title.is_empty()
    {
        log!("build"; "{}", info.title);
    }
    log!("build"; "wrote {} ({} resources)", surface.path().display(), count);

    Ok(surface.path().to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::CodepadConfig;
    use crate::workspace::Workspace;

    #[test]
    fn test_build_writes_document_and_resources() {
        let temp = tempfile::Builder::new().prefix("project").tempdir().unwrap();
        let config = CodepadConfig {
            root: temp.path().to_path_buf(),
            ..CodepadConfig::default()
        };
        let project = Project {
            config: Arc::new(config),
            workspace: Workspace::starter(),
        };

        let index = build_project(&project).unwrap();
        assert_eq!(index, temp.path().join("public/index.html"));

        let html = fs::read_to_string(&index).unwrap();
        assert!(!html.contains(r#"href="styles.css""#));
        assert!(!html.contains(r#"src="script.js""#));
        assert!(html.contains(r#"href="res/res-1-"#));

        let written = fs::read_dir(temp.path().join("public/res")).unwrap().count();
        assert_eq!(written, 2);

        // a second build replaces the resources instead of piling them up
        build_project(&project).unwrap();
        let written = fs::read_dir(temp.path().join("public/res")).unwrap().count();
        assert_eq!(written, 2);
    }
}
