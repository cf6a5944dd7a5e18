//! Remote Execution Client
//!
//! Runs server-side scripts on an external sandbox service through a
//! create/poll protocol:
//!
//! ```text
//! Idle → Submitting → Polling → Completed
//!            │           ├────→ Failed
//!            └───────────┴────→ TimedOut / Cancelled
//! ```
//!
//! - `service` - `ExecutionService` trait and wire types
//! - `paiza` - reqwest client for paiza-compatible runners
//! - `language` - per-language preamble and form binding injection
//! - `job` - the polling state machine
//! - `classify` - turn a finished job into a document or diagnostics
//!
//! Every error is caught at the job boundary and turned into a
//! `DiagnosticReport`; nothing here propagates to the scheduler.

pub mod classify;
pub mod job;
pub mod language;
pub mod paiza;
pub mod service;

#[cfg(test)]
pub(crate) mod tests;

use thiserror::Error;

use crate::compiler::{Diagnostic, DiagnosticKind};

pub use classify::{Classified, classify, failure_report, splice_style};
pub use job::{JobResult, JobState, PollSettings, RemoteExecutionJob};
pub use language::{BUNDLED_MODULES, Language, is_module_name};
pub use paiza::PaizaClient;
pub use service::{CreatedJob, ExecutionService, JobStatus, ServiceError};

/// Why a remote job ended without a usable result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("job submission failed: {0}")]
    Submission(String),

    #[error("status request failed: {0}")]
    Transport(String),

    #[error("build failed: {0}")]
    Build(String),

    #[error("execution failed: {0}")]
    Runtime(String),

    #[error("no result after {attempts} status checks")]
    Timeout { attempts: u32 },

    #[error("job was cancelled")]
    Cancelled,
}

impl RemoteError {
    /// Error section for the diagnostics report. Cancelled jobs show nothing.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        let (kind, message) = match self {
            Self::Submission(msg) => (DiagnosticKind::Submission, msg.clone()),
            Self::Transport(msg) => (DiagnosticKind::Transport, msg.clone()),
            Self::Build(msg) => (DiagnosticKind::Build, msg.clone()),
            Self::Runtime(msg) => (DiagnosticKind::Runtime, msg.clone()),
            Self::Timeout { attempts } => (
                DiagnosticKind::Timeout,
                format!("no result after {attempts} status checks"),
            ),
            Self::Cancelled => return None,
        };
        Some(Diagnostic::new(kind, message))
    }
}
