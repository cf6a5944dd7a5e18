//! Workspace file entity.

use std::fmt;

use crate::core::FileKind;

/// Reserved name of the zero-content file that keeps an empty directory alive.
pub const DIRECTORY_MARKER: &str = ".directory";

/// Opaque file identifier, never reused within a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub(super) u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single file in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFile {
    pub id: FileId,
    /// Unique within `directory`
    pub name: String,
    pub content: String,
    pub kind: FileKind,
    /// Slash-separated directory path, empty for the root
    pub directory: String,
}

impl WorkspaceFile {
    /// Whether this is a directory marker rather than a regular file.
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.name == DIRECTORY_MARKER
    }

    /// Path relative to the workspace root (`dir/name` or `name`).
    pub fn path(&self) -> String {
        join_path(&self.directory, &self.name)
    }

    /// Whether this file lives in `dir` or any directory below it.
    ///
    /// Segment-aware: `src` covers `src/css` but not `srcs`.
    pub fn is_within(&self, dir: &str) -> bool {
        is_same_or_descendant(&self.directory, dir)
    }
}

/// Join a directory path and a name, skipping the separator at the root.
pub fn join_path(directory: &str, name: &str) -> String {
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{directory}/{name}")
    }
}

pub(super) fn is_same_or_descendant(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        return true;
    }
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "index.html"), "index.html");
        assert_eq!(join_path("src/css", "a.css"), "src/css/a.css");
    }

    #[test]
    fn test_descendant_is_segment_aware() {
        assert!(is_same_or_descendant("src", "src"));
        assert!(is_same_or_descendant("src/css", "src"));
        assert!(!is_same_or_descendant("srcs", "src"));
        assert!(!is_same_or_descendant("lib/src", "src"));
        assert!(is_same_or_descendant("anything", ""));
    }
}
