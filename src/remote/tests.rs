//! Polling state machine tests against a scripted in-process service.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::*;

/// One scripted answer to a status request.
pub(crate) enum Reply {
    Status(JobStatus),
    Unreachable,
}

impl Reply {
    pub(crate) fn running() -> Self {
        Self::Status(JobStatus {
            status: "running".to_string(),
            ..JobStatus::default()
        })
    }

    pub(crate) fn completed(stdout: &str, stderr: &str) -> Self {
        Self::Status(JobStatus {
            status: "completed".to_string(),
            stdout: Some(stdout.to_string()),
            stderr: Some(stderr.to_string()),
            ..JobStatus::default()
        })
    }

    pub(crate) fn error(message: &str) -> Self {
        Self::Status(JobStatus {
            status: "completed".to_string(),
            error: Some(message.to_string()),
            ..JobStatus::default()
        })
    }
}

/// Execution service answering from a script.
///
/// Status requests beyond the script answer `running`.
pub(crate) struct ScriptedService {
    create: Option<CreatedJob>,
    replies: Mutex<VecDeque<Reply>>,
    latency: Duration,
    pub(crate) creates: AtomicU32,
    pub(crate) polls: AtomicU32,
    pub(crate) sources: Mutex<Vec<String>>,
    pub(crate) stdins: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            create: Some(CreatedJob {
                id: Some("job-1".to_string()),
                error: None,
            }),
            replies: Mutex::new(replies.into_iter().collect()),
            latency: Duration::ZERO,
            creates: AtomicU32::new(0),
            polls: AtomicU32::new(0),
            sources: Mutex::new(Vec::new()),
            stdins: Mutex::new(Vec::new()),
        }
    }

    /// Never completes.
    pub(crate) fn running_forever() -> Self {
        Self::new([])
    }

    /// Completes on the `poll`-th status request.
    pub(crate) fn completing_on(poll: u32, stdout: &str) -> Self {
        let running = (1..poll).map(|_| Reply::running());
        Self::new(running.chain([Reply::completed(stdout, "")]))
    }

    /// Creation answered with `reply`; `None` makes the endpoint unreachable.
    pub(crate) fn with_create(mut self, reply: Option<CreatedJob>) -> Self {
        self.create = reply;
        self
    }

    /// Delay every request by `latency`.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub(crate) fn create_count(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn unreachable() -> ServiceError {
    ServiceError::Status {
        status: 503,
        body: "service unavailable".to_string(),
    }
}

impl ExecutionService for ScriptedService {
    async fn create_job(
        &self,
        source: &str,
        _language: Language,
        stdin: &str,
    ) -> Result<CreatedJob, ServiceError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().push(source.to_string());
        self.stdins.lock().push(stdin.to_string());
        self.wait().await;
        self.create.clone().ok_or_else(unreachable)
    }

    async fn job_status(&self, _id: &str) -> Result<JobStatus, ServiceError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let reply = self.replies.lock().pop_front().unwrap_or_else(Reply::running);
        match reply {
            Reply::Status(status) => Ok(status),
            Reply::Unreachable => Err(unreachable()),
        }
    }
}

fn settings() -> PollSettings {
    PollSettings {
        interval: Duration::from_secs(1),
        max_attempts: 10,
    }
}

fn job() -> RemoteExecutionJob {
    RemoteExecutionJob::new("<?php echo 'hi';", Language::Php)
}

#[tokio::test(start_paused = true)]
async fn test_times_out_after_attempt_budget() {
    let service = Arc::new(ScriptedService::running_forever());
    let mut job = job();
    let start = Instant::now();

    let outcome = job.run(&*service, settings(), &CancellationToken::new()).await;

    assert_eq!(outcome, Err(RemoteError::Timeout { attempts: 10 }));
    assert_eq!(job.state, JobState::TimedOut);
    assert_eq!(job.attempt, 10);
    assert_eq!(service.poll_count(), 10);
    assert_eq!(start.elapsed(), Duration::from_secs(10));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(service.poll_count(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_completes_on_third_poll() {
    let service = ScriptedService::completing_on(3, "hello");
    let mut job = job();

    let result = job
        .run(&service, settings(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.stdout, "hello");
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(job.job_id.as_deref(), Some("job-1"));
    assert_eq!(job.result, Some(result));
    assert_eq!(service.poll_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_error_field_is_terminal() {
    let service = ScriptedService::new([Reply::running(), Reply::error("Invalid ID")]);
    let mut job = job();

    let outcome = job.run(&service, settings(), &CancellationToken::new()).await;

    assert_eq!(outcome, Err(RemoteError::Runtime("Invalid ID".to_string())));
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(service.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_submission_error() {
    let service = ScriptedService::running_forever().with_create(Some(CreatedJob {
        id: None,
        error: Some("invalid api_key".to_string()),
    }));
    let mut job = job();

    let outcome = job.run(&service, settings(), &CancellationToken::new()).await;

    assert_eq!(outcome, Err(RemoteError::Submission("invalid api_key".to_string())));
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(service.poll_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_on_submit() {
    let service = ScriptedService::running_forever().with_create(None);
    let mut job = job();

    let outcome = job.run(&service, settings(), &CancellationToken::new()).await;

    assert!(matches!(outcome, Err(RemoteError::Submission(msg)) if msg.contains("503")));
    assert!(job.job_id.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_while_polling() {
    let service = ScriptedService::new([Reply::running(), Reply::Unreachable]);
    let mut job = job();

    let outcome = job.run(&service, settings(), &CancellationToken::new()).await;

    assert!(matches!(outcome, Err(RemoteError::Transport(_))));
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(service.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let service = Arc::new(ScriptedService::running_forever());
    let cancel = CancellationToken::new();

    let task = {
        let service = Arc::clone(&service);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut job = job();
            let outcome = job.run(&*service, settings(), &cancel).await;
            (job.state, outcome)
        })
    };

    tokio::time::sleep(Duration::from_millis(2500)).await;
    cancel.cancel();
    let (state, outcome) = task.await.unwrap();

    assert_eq!(state, JobState::Cancelled);
    assert_eq!(outcome, Err(RemoteError::Cancelled));
    assert_eq!(service.poll_count(), 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.poll_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_published() {
    let service = ScriptedService::completing_on(1, "<html></html>");
    let mut job = job();
    let progress = job.subscribe();
    assert_eq!(*progress.borrow(), JobState::Idle);

    job.run(&service, settings(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(*progress.borrow(), JobState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_submitted_source_is_forwarded() {
    let service = ScriptedService::completing_on(1, "ok");
    let mut job = RemoteExecutionJob::new("print(1)", Language::Python).with_stdin("42\n");

    job.run(&service, settings(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(service.create_count(), 1);
    assert_eq!(service.sources.lock().as_slice(), ["print(1)".to_string()]);
}
