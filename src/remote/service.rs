//! The remote execution service seen from the client.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use super::Language;

/// Transport-level failures talking to the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("service answered {status}: {body}")]
    Status { status: u16, body: String },
}

/// Reply to a job-creation request: an id or an error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CreatedJob {
    pub id: Option<String>,
    pub error: Option<String>,
}

/// Reply to a status request.
///
/// `error` is terminal regardless of `status`. Any status other than
/// `completed` counts as still pending.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobStatus {
    pub status: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub build_stderr: Option<String>,
    pub error: Option<String>,
}

impl JobStatus {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }

    /// Structural error reported by the service, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// A sandboxed execution backend.
pub trait ExecutionService: Send + Sync + 'static {
    /// Submit `source` for execution.
    fn create_job(
        &self,
        source: &str,
        language: Language,
        stdin: &str,
    ) -> impl Future<Output = Result<CreatedJob, ServiceError>> + Send;

    /// Query the status of a submitted job.
    fn job_status(&self, id: &str) -> impl Future<Output = Result<JobStatus, ServiceError>> + Send;
}
