//! Local Compilation Pipeline
//!
//! Assembles the markup/style/script entry files into one renderable
//! document and owns the resource handles that document references.
//!
//! ```text
//! Workspace --assemble--> Document (html + handles) --install--> Surface
//!                              ^                                    |
//!                              +---- previous handles released -----+
//! ```
//!
//! - `resource` - `ResourceStore` trait, in-memory and directory stores
//! - `artifact` - `CompiledArtifact`, `DiagnosticReport`
//! - `pipeline` - entry-file selection and placeholder substitution

pub mod artifact;
pub mod pipeline;
pub mod resource;


use thiserror::Error;

pub use artifact::{CompiledArtifact, Diagnostic, DiagnosticKind, DiagnosticReport, Document};
pub use pipeline::assemble;
pub use resource::{DirStore, MemoryStore, ResourceHandle, ResourceStats, ResourceStore};

/// Local assembly failures. The previous artifact stays live on any of these.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("failed to allocate {mime} resource: {reason}")]
    Allocation { mime: &'static str, reason: String },

    #[error("failed to write resource `{0}`")]
    Io(std::path::PathBuf, #[source] std::io::Error),

    #[error("rendering surface rejected the artifact")]
    Render(#[source] std::io::Error),
}
