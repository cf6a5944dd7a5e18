//! The create/poll state machine.

use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::service::{CreatedJob, ExecutionService, JobStatus};
use super::{Language, RemoteError};
use crate::config::RemoteConfig;
use crate::debug;

/// Lifecycle of one remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::TimedOut | Self::Cancelled
        )
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }
}

/// Output of a completed job. Missing streams are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobResult {
    pub stdout: String,
    pub stderr: String,
    pub build_stderr: String,
}

impl From<JobStatus> for JobResult {
    fn from(status: JobStatus) -> Self {
        Self {
            stdout: status.stdout.unwrap_or_default(),
            stderr: status.stderr.unwrap_or_default(),
            build_stderr: status.build_stderr.unwrap_or_default(),
        }
    }
}

/// Poll pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl From<&RemoteConfig> for PollSettings {
    fn from(config: &RemoteConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_attempts: config.max_attempts,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&RemoteConfig::default())
    }
}

/// One submission of a server script and the polling that follows.
#[derive(Debug)]
pub struct RemoteExecutionJob {
    pub job_id: Option<String>,
    pub submitted_source: String,
    pub language: Language,
    pub stdin: String,
    pub state: JobState,
    /// Status requests issued so far
    pub attempt: u32,
    pub result: Option<JobResult>,
    progress: Option<watch::Sender<JobState>>,
}

impl RemoteExecutionJob {
    /// `source` must already be prepared (preamble and bindings applied).
    pub fn new(source: impl Into<String>, language: Language) -> Self {
        Self {
            job_id: None,
            submitted_source: source.into(),
            language,
            stdin: String::new(),
            state: JobState::Idle,
            attempt: 0,
            result: None,
            progress: None,
        }
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = stdin.into();
        self
    }

    /// Publish state transitions; the receiver sees the latest state.
    pub fn subscribe(&mut self) -> watch::Receiver<JobState> {
        let (tx, rx) = watch::channel(self.state);
        self.progress = Some(tx);
        rx
    }

    /// Drive the job to a terminal state.
    ///
    /// Each round sleeps `interval`, then issues one status request. The
    /// `error` field ends the job immediately. After `max_attempts`
    /// requests without completion the job times out and no further
    /// request is made. Cancellation is observed at every suspension point.
    pub async fn run<S: ExecutionService>(
        &mut self,
        service: &S,
        settings: PollSettings,
        cancel: &CancellationToken,
    ) -> Result<JobResult, RemoteError> {
        self.transition(JobState::Submitting);

        let created = tokio::select! {
            biased;
            _ = cancel.cancelled() => return self.cancelled(),
            created = service.create_job(&self.submitted_source, self.language, &self.stdin) => created,
        };

        let id = match created {
            Ok(CreatedJob { error: Some(error), .. }) if !error.trim().is_empty() => {
                return self.fail(RemoteError::Submission(error));
            }
            Ok(CreatedJob { id: Some(id), .. }) => id,
            Ok(_) => return self.fail(RemoteError::Submission("no job id returned".to_string())),
            Err(e) => return self.fail(RemoteError::Submission(e.to_string())),
        };

        debug!("remote"; "job {} created", id);
        self.job_id = Some(id.clone());
        self.transition(JobState::Polling);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(),
                _ = tokio::time::sleep(settings.interval) => {}
            }

            self.attempt += 1;
            let status = tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.cancelled(),
                status = service.job_status(&id) => status,
            };

            let status = match status {
                Ok(status) => status,
                Err(e) => return self.fail(RemoteError::Transport(e.to_string())),
            };

            if let Some(error) = status.error() {
                return self.fail(structural_error(error, &status));
            }

            if status.is_completed() {
                let result = JobResult::from(status);
                self.result = Some(result.clone());
                self.transition(JobState::Completed);
                return Ok(result);
            }

            debug!("remote"; "job {} {} (attempt {}/{})", id, status.status, self.attempt, settings.max_attempts);

            if self.attempt >= settings.max_attempts {
                self.transition(JobState::TimedOut);
                return Err(RemoteError::Timeout {
                    attempts: self.attempt,
                });
            }
        }
    }

    fn transition(&mut self, state: JobState) {
        self.state = state;
        if let Some(tx) = &self.progress {
            tx.send_replace(state);
        }
    }

    fn fail(&mut self, error: RemoteError) -> Result<JobResult, RemoteError> {
        self.transition(JobState::Failed);
        Err(error)
    }

    fn cancelled(&mut self) -> Result<JobResult, RemoteError> {
        self.transition(JobState::Cancelled);
        Err(RemoteError::Cancelled)
    }
}

/// Map the service's `error` field to a build or runtime failure.
fn structural_error(error: &str, status: &JobStatus) -> RemoteError {
    let non_empty = |s: &Option<String>| s.clone().filter(|s| !s.trim().is_empty());

    if let Some(build) = non_empty(&status.build_stderr) {
        return RemoteError::Build(format!("{error}\n{build}"));
    }
    match non_empty(&status.stderr) {
        Some(stderr) => RemoteError::Runtime(format!("{error}\n{stderr}")),
        None => RemoteError::Runtime(error.to_string()),
    }
}
