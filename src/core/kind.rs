//! File kind definitions.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Kind of workspace file, determines compilation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Markup entry (.html) - assembled by the local pipeline
    Markup,
    /// Stylesheet (.css) - wrapped into a resource handle
    Style,
    /// Client script (.js) - wrapped into a resource handle
    Script,
    /// Server-side script (.php, .py) - executed remotely
    ServerScript,
    /// Markdown notes (.md)
    Markdown,
    /// Anything else, including directory markers
    PlainText,
}

impl FileKind {
    pub const ALL: [Self; 6] = [
        Self::Markup,
        Self::Style,
        Self::Script,
        Self::ServerScript,
        Self::Markdown,
        Self::PlainText,
    ];

    /// Detect file kind from extension. Unknown extensions are plain text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Self::Markup,
            "css" => Self::Style,
            "js" | "mjs" => Self::Script,
            "php" | "py" => Self::ServerScript,
            "md" | "markdown" => Self::Markdown,
            _ => Self::PlainText,
        }
    }

    /// Detect file kind from file path.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::PlainText, Self::from_extension)
    }

    /// Extension used for generated file names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markup => "html",
            Self::Style => "css",
            Self::Script => "js",
            Self::ServerScript => "php",
            Self::Markdown => "md",
            Self::PlainText => "txt",
        }
    }

    /// MIME type used when the content is wrapped into a resource.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Markup => "text/html",
            Self::Style => "text/css",
            Self::Script => "application/javascript",
            Self::ServerScript | Self::Markdown | Self::PlainText => "text/plain",
        }
    }

    /// Display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Style => "style",
            Self::Script => "script",
            Self::ServerScript => "server",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
        }
    }

    /// Executed by the remote service rather than the local pipeline.
    #[inline]
    pub fn is_server_side(self) -> bool {
        self == Self::ServerScript
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FileKind::from_extension("HTML"), FileKind::Markup);
        assert_eq!(FileKind::from_extension("css"), FileKind::Style);
        assert_eq!(FileKind::from_extension("js"), FileKind::Script);
        assert_eq!(FileKind::from_extension("php"), FileKind::ServerScript);
        assert_eq!(FileKind::from_extension("py"), FileKind::ServerScript);
        assert_eq!(FileKind::from_extension("toml"), FileKind::PlainText);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FileKind::from_path(Path::new("src/index.htm")), FileKind::Markup);
        assert_eq!(FileKind::from_path(Path::new("README")), FileKind::PlainText);
    }

    #[test]
    fn test_only_server_script_is_remote() {
        for kind in FileKind::ALL {
            assert_eq!(kind.is_server_side(), kind == FileKind::ServerScript);
        }
    }
}
