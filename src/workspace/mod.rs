//! Workspace Model
//!
//! In-memory virtual file system plus the active-file pointer.
//!
//! ```text
//! workspace/
//! ├── file.rs      # WorkspaceFile, FileId, directory markers
//! ├── template.rs  # Starter markup/style/script
//! ├── project.rs   # Load from / snapshot to disk
//! └── mod.rs       # Workspace CRUD (this file)
//! ```
//!
//! Directories only exist through the files in them. An empty directory is
//! kept alive by a zero-content `.directory` marker file; removing the
//! marker removes the whole subtree.

mod file;
pub mod project;
pub mod template;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::core::FileKind;

pub use file::{DIRECTORY_MARKER, FileId, WorkspaceFile, join_path};

/// Workspace mutation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("no file with id {0}")]
    UnknownFile(FileId),

    #[error("file name must not be empty")]
    EmptyName,

    #[error("`{0}` is reserved for directory markers")]
    ReservedName(String),

    #[error("`{}` already exists", join_path(.directory, .name))]
    NameTaken { directory: String, name: String },
}

/// One `{path, content}` entry handed to the archive exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub path: String,
    pub content: String,
}

/// Title and description shown next to the preview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewInfo {
    pub title: String,
    pub description: String,
}

/// The in-memory set of files plus the active-file pointer.
#[derive(Debug, Default)]
pub struct Workspace {
    files: Vec<WorkspaceFile>,
    active: Option<FileId>,
    /// Next id to hand out; ids are never reused
    next_id: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace with the starter markup/style/script under `src/`.
    pub fn starter() -> Self {
        let mut ws = Self::new();
        let index = ws.insert("index.html", FileKind::Markup, "src", template::DEFAULT_MARKUP);
        ws.insert("styles.css", FileKind::Style, "src", template::DEFAULT_STYLE);
        ws.insert("script.js", FileKind::Script, "src", template::DEFAULT_SCRIPT);
        ws.active = Some(index);
        ws
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn files(&self) -> &[WorkspaceFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, id: FileId) -> Option<&WorkspaceFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn active_id(&self) -> Option<FileId> {
        self.active
    }

    pub fn active(&self) -> Option<&WorkspaceFile> {
        self.active.and_then(|id| self.get(id))
    }

    /// First regular file of `kind` in insertion order (the entry file).
    pub fn first_of_kind(&self, kind: FileKind) -> Option<&WorkspaceFile> {
        self.files.iter().find(|f| f.kind == kind && !f.is_marker())
    }

    /// Find a file by its workspace-relative path.
    pub fn find_by_path(&self, path: &str) -> Option<&WorkspaceFile> {
        let path = path.trim_matches('/');
        self.files.iter().find(|f| f.path() == path)
    }

    /// Distinct directory paths, sorted. The root is the empty string.
    pub fn list_directories(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|f| f.directory.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Regular files for the archive exporter, markers skipped.
    pub fn export_entries(&self) -> Vec<ExportEntry> {
        self.files
            .iter()
            .filter(|f| !f.is_marker())
            .map(|f| ExportEntry {
                path: f.path(),
                content: f.content.clone(),
            })
            .collect()
    }

    /// Title/description of the active markup file, if the active file is markup.
    pub fn preview_info(&self) -> Option<PreviewInfo> {
        static TITLE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"(?is)<title>(.*?)</title>").expect("valid regex"));
        static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"(?is)<meta\s+name="description"\s+content="(.*?)""#).expect("valid regex")
        });

        let file = self.active().filter(|f| f.kind == FileKind::Markup)?;
        let capture = |re: &Regex| {
            re.captures(&file.content)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default()
        };

        Some(PreviewInfo {
            title: capture(&TITLE),
            description: capture(&DESCRIPTION),
        })
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Add a new file of `kind` in `directory` and make it active.
    ///
    /// The name is generated (`new_file<n>.<ext>`); markup files start from
    /// the default template, everything else starts empty.
    pub fn add_file(&mut self, kind: FileKind, directory: &str) -> FileId {
        let directory = normalize_dir(directory);
        let name = self.generated_name(kind, &directory);
        let content = match kind {
            FileKind::Markup => template::DEFAULT_MARKUP,
            _ => "",
        };
        let id = self.insert(&name, kind, &directory, content);
        self.active = Some(id);
        id
    }

    /// Add a file with an explicit name and content.
    ///
    /// Becomes active only when nothing else is.
    pub fn add_named_file(
        &mut self,
        name: &str,
        kind: FileKind,
        directory: &str,
        content: impl Into<String>,
    ) -> Result<FileId, WorkspaceError> {
        let directory = normalize_dir(directory);
        self.check_name(name, &directory, None)?;
        let id = self.insert(name, kind, &directory, content);
        if self.active.is_none() {
            self.active = Some(id);
        }
        Ok(id)
    }

    /// Create directory `parent/name` by inserting a marker file.
    ///
    /// Returns `None` for an empty name or an already existing directory.
    pub fn add_directory(&mut self, parent: &str, name: &str) -> Option<FileId> {
        let name = name.trim().trim_matches('/');
        if name.is_empty() {
            return None;
        }

        let directory = join_path(&normalize_dir(parent), name);
        let exists = self
            .files
            .iter()
            .any(|f| f.is_marker() && f.directory == directory);
        if exists {
            return None;
        }

        let id = self.insert(DIRECTORY_MARKER, FileKind::PlainText, &directory, "");
        if self.active.is_none() {
            self.active = Some(id);
        }
        Some(id)
    }

    /// Remove a file. Removing a directory marker removes the whole subtree.
    ///
    /// Returns the ids that were removed (empty for an unknown id).
    pub fn remove_file(&mut self, id: FileId) -> Vec<FileId> {
        let Some(target) = self.get(id) else {
            return Vec::new();
        };

        let removed: Vec<FileId> = if target.is_marker() {
            let dir = target.directory.clone();
            self.files
                .iter()
                .filter(|f| f.is_within(&dir))
                .map(|f| f.id)
                .collect()
        } else {
            vec![id]
        };

        self.files.retain(|f| !removed.contains(&f.id));

        if self.active.is_some_and(|active| removed.contains(&active)) {
            self.active = self
                .files
                .iter()
                .find(|f| !f.is_marker())
                .or_else(|| self.files.first())
                .map(|f| f.id);
        }

        removed
    }

    /// Rename a file in place. Id, directory and content are kept.
    pub fn rename_file(&mut self, id: FileId, new_name: &str) -> Result<(), WorkspaceError> {
        let new_name = new_name.trim();
        let directory = self
            .get(id)
            .map(|f| f.directory.clone())
            .ok_or(WorkspaceError::UnknownFile(id))?;
        self.check_name(new_name, &directory, Some(id))?;

        if let Some(file) = self.files.iter_mut().find(|f| f.id == id) {
            file.name = new_name.to_string();
        }
        Ok(())
    }

    pub fn set_active(&mut self, id: FileId) -> Result<(), WorkspaceError> {
        if self.get(id).is_none() {
            return Err(WorkspaceError::UnknownFile(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Replace a file's content (an edit event from the editing surface).
    pub fn update_content(
        &mut self,
        id: FileId,
        content: impl Into<String>,
    ) -> Result<&WorkspaceFile, WorkspaceError> {
        let file = self
            .files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(WorkspaceError::UnknownFile(id))?;
        file.content = content.into();
        Ok(file)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn insert(
        &mut self,
        name: &str,
        kind: FileKind,
        directory: &str,
        content: impl Into<String>,
    ) -> FileId {
        self.next_id += 1;
        let id = FileId(self.next_id);
        self.files.push(WorkspaceFile {
            id,
            name: name.to_string(),
            content: content.into(),
            kind,
            directory: directory.to_string(),
        });
        id
    }

    fn generated_name(&self, kind: FileKind, directory: &str) -> String {
        let mut n = self.next_id + 1;
        loop {
            let name = format!("new_file{n}.{}", kind.extension());
            if !self.name_taken(&name, directory, None) {
                return name;
            }
            n += 1;
        }
    }

    fn check_name(
        &self,
        name: &str,
        directory: &str,
        except: Option<FileId>,
    ) -> Result<(), WorkspaceError> {
        if name.is_empty() {
            return Err(WorkspaceError::EmptyName);
        }
        if name == DIRECTORY_MARKER {
            return Err(WorkspaceError::ReservedName(name.to_string()));
        }
        if self.name_taken(name, directory, except) {
            return Err(WorkspaceError::NameTaken {
                directory: directory.to_string(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn name_taken(&self, name: &str, directory: &str, except: Option<FileId>) -> bool {
        self.files
            .iter()
            .any(|f| f.directory == directory && f.name == name && Some(f.id) != except)
    }
}

fn normalize_dir(dir: &str) -> String {
    dir.trim().trim_matches('/').to_string()
}
