//! Load a project directory from disk into a [`Workspace`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use jwalk::WalkDir;

use super::Workspace;
use crate::core::FileKind;
use crate::debug;

/// Read every file below `root` into a new workspace.
///
/// Hidden entries (including `.directory` markers), files that are not
/// UTF-8 text and anything under `skip` (typically the output directory)
/// are ignored. Directories without
/// regular files become marker files. The first markup file becomes active.
pub fn load_project(root: &Path, skip: &[PathBuf]) -> Result<Workspace> {
    let mut ws = Workspace::new();
    let mut dirs = Vec::new();

    let entries = WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.depth() > 0)
        .filter(|e| !is_hidden(root, &e.path()))
        .filter(|e| !skip.iter().any(|s| e.path().starts_with(s)));

    for entry in entries {
        let path = entry.path();
        let Some((directory, name)) = split_relative(root, &path) else {
            continue;
        };

        if entry.file_type().is_dir() {
            dirs.push(super::join_path(&directory, &name));
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        // Non-UTF-8 files (images, fonts) stay out of the workspace
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("project"; "skip {}: {}", path.display(), e);
                continue;
            }
        };
        ws.add_named_file(&name, FileKind::from_path(&path), &directory, content)?;
    }

    // Empty directories only survive as markers; deepest first so a parent
    // that only holds an empty child needs no marker of its own
    for dir in dirs.into_iter().rev() {
        let has_files = ws.files().iter().any(|f| f.is_within(&dir));
        if !has_files {
            let (parent, name) = dir.rsplit_once('/').unwrap_or(("", dir.as_str()));
            ws.add_directory(parent, name);
        }
    }

    if let Some(markup) = ws.first_of_kind(FileKind::Markup).map(|f| f.id) {
        ws.set_active(markup)?;
    }

    Ok(ws)
}

pub(crate) fn is_hidden(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root).is_ok_and(|rel| {
        rel.components()
            .any(|c| c.as_os_str().to_str().is_some_and(|s| s.starts_with('.')))
    })
}

/// Split `path` into a workspace `(directory, name)` pair relative to `root`.
pub fn split_relative(root: &Path, path: &Path) -> Option<(String, String)> {
    let relative = path.strip_prefix(root).ok()?;
    let name = relative.file_name()?.to_str()?.to_string();
    let directory = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    Some((directory, name))
}
