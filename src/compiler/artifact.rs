//! Compiled artifacts: what gets installed onto the rendering surface.

use std::fmt;
use std::io;

use super::resource::{ResourceHandle, ResourceStore};
use crate::surface::Surface;

/// Result of one compilation or execution cycle.
#[derive(Debug)]
pub enum CompiledArtifact {
    Document(Document),
    Diagnostics(DiagnosticReport),
}

impl CompiledArtifact {
    /// Push this artifact to the surface.
    pub fn render(&self, surface: &mut dyn Surface) -> io::Result<()> {
        match self {
            Self::Document(doc) => surface.set_document(&doc.html),
            Self::Diagnostics(report) => {
                let error = report.error().map(ToString::to_string);
                surface.set_diagnostics(report.output(), error.as_deref())
            }
        }
    }

    /// Release every resource this artifact owns.
    pub fn release(self, store: &mut dyn ResourceStore) {
        if let Self::Document(doc) = self {
            doc.release(store);
        }
    }

    /// Rendered error section, if this artifact carries one.
    pub fn error_summary(&self) -> Option<String> {
        match self {
            Self::Diagnostics(report) => report.error().map(ToString::to_string),
            Self::Document(_) => None,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document(_))
    }

    /// Short label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Diagnostics(report) if report.error().is_some() => "error",
            Self::Diagnostics(_) => "output",
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// Renderable markup plus the resource handles it references.
#[derive(Debug)]
pub struct Document {
    pub html: String,
    pub resources: Vec<ResourceHandle>,
}

impl Document {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            resources: Vec::new(),
        }
    }

    pub fn release(self, store: &mut dyn ResourceStore) {
        for handle in self.resources {
            store.release(handle);
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Why a run produced diagnostics instead of (or next to) output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The job could not be created
    Submission,
    /// A status request failed in transit
    Transport,
    /// Compile-phase failure reported by the service
    Build,
    /// Execution-phase stderr
    Runtime,
    /// An import failed because the sandbox lacks the module
    MissingModule,
    /// The attempt budget ran out before the job finished
    Timeout,
    /// The job finished without printing anything
    NoOutput,
}

impl DiagnosticKind {
    pub fn heading(self) -> &'static str {
        match self {
            Self::Submission => "Could not submit the job",
            Self::Transport => "Lost contact with the execution service",
            Self::Build => "Build error",
            Self::Runtime => "Runtime error",
            Self::MissingModule => "Module not available",
            Self::Timeout => "Execution did not finish",
            Self::NoOutput => "No output received",
        }
    }
}

/// A single error section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message.trim_end();
        if message.is_empty() {
            f.write_str(self.kind.heading())
        } else {
            write!(f, "{}: {}", self.kind.heading(), message)
        }
    }
}

/// Independent, presence-gated output and error sections.
///
/// A section whose text is empty (or whitespace) is absent rather than
/// rendered blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticReport {
    output: Option<String>,
    error: Option<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new(output: Option<&str>, error: Option<Diagnostic>) -> Self {
        Self {
            output: output
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
            error,
        }
    }

    /// Report with only an error section.
    pub fn failure(error: Diagnostic) -> Self {
        Self::new(None, Some(error))
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn error(&self) -> Option<&Diagnostic> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_hides_empty_sections() {
        let report = DiagnosticReport::new(Some("  \n"), None);
        assert_eq!(report.output(), None);
        assert_eq!(report.error(), None);

        let report = DiagnosticReport::new(Some("hello\n"), None);
        assert_eq!(report.output(), Some("hello\n"));
    }

    #[test]
    fn test_timeout_worded_differently() {
        let timeout = Diagnostic::new(DiagnosticKind::Timeout, "no result after 10 status checks");
        let runtime = Diagnostic::new(DiagnosticKind::Runtime, "PHP Warning: division by zero");
        let build = Diagnostic::new(DiagnosticKind::Build, "syntax error");

        let timeout = timeout.to_string();
        assert!(timeout.starts_with("Execution did not finish"));
        assert_ne!(
            timeout.split(':').next(),
            runtime.to_string().split(':').next()
        );
        assert_ne!(
            timeout.split(':').next(),
            build.to_string().split(':').next()
        );
    }

    #[test]
    fn test_diagnostic_without_message() {
        let diag = Diagnostic::new(DiagnosticKind::NoOutput, "");
        assert_eq!(diag.to_string(), "No output received");
    }
}
