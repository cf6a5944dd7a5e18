//! Engine Actor - single-flight scheduling over one session
//!
//! Handles edit, activation and rerun requests:
//! - Edits of client-side files: trailing-debounced local recompile
//! - Edits of server scripts: stored only, never recompiled
//! - Activation: immediate recompile (or remote run) for the new file
//! - Rerun: one remote job per file; reject or cancel while one is running
//!
//! Every compile and job is tagged with a request token when scheduled;
//! only the latest token's result reaches the surface.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::debouncer::Debouncer;
use super::messages::{EngineError, EngineMsg, JobFinished, RerunError};
use super::session::Session;
use crate::compiler::AssemblyError;
use crate::config::RerunPolicy;
use crate::core::{FileKind, RequestToken};
use crate::logger::{status_error, status_success};
use crate::remote::{ExecutionService, JobState, PollSettings};
use crate::workspace::{FileId, WorkspaceError};
use crate::{debug, log};

/// Channel buffer size
const CHANNEL_BUFFER: usize = 32;

/// A job spawned by the engine and not yet reported back.
struct RunningJob {
    token: RequestToken,
    cancel: CancellationToken,
    state: watch::Receiver<JobState>,
}

pub struct EngineActor<S> {
    rx: mpsc::Receiver<EngineMsg>,
    job_tx: mpsc::UnboundedSender<JobFinished>,
    job_rx: mpsc::UnboundedReceiver<JobFinished>,
    session: Session,
    service: Arc<S>,
    debouncer: Debouncer,
    jobs: FxHashMap<FileId, RunningJob>,
    /// Print watch-status lines after each install
    report: bool,
}

impl<S: ExecutionService> EngineActor<S> {
    /// Create the actor and the handle that feeds it.
    pub fn new(session: Session, service: Arc<S>) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER);
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::new(session.config().schedule.debounce());
        let actor = Self {
            rx,
            job_tx,
            job_rx,
            session,
            service,
            debouncer,
            jobs: FxHashMap::default(),
            report: false,
        };
        (actor, EngineHandle { tx })
    }

    /// Enable watch-status output.
    pub fn with_status(mut self) -> Self {
        self.report = true;
        self
    }

    /// Run the actor event loop
    pub async fn run(mut self) -> Session {
        debug!("engine"; "start");
        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                biased;
                msg = self.rx.recv() => match msg {
                    Some(EngineMsg::Shutdown) | None => break,
                    Some(msg) => self.handle(msg),
                },
                Some(done) = self.job_rx.recv() => self.handle_finished(done),
                _ = tokio::time::sleep_until(deadline) => self.flush_debounced(),
            }
        }

        for (_, job) in self.jobs.drain() {
            job.cancel.cancel();
        }
        self.session.close();
        debug!("engine"; "stopped");
        self.session
    }

    fn handle(&mut self, msg: EngineMsg) {
        match msg {
            EngineMsg::Edit { file, content } => self.handle_edit(file, content),
            EngineMsg::Activate { file, reply } => {
                let _ = reply.send(self.handle_activate(file));
            }
            EngineMsg::Rerun { file, reply } => {
                let result = file
                    .or_else(|| self.session.workspace().active_id())
                    .ok_or(RerunError::NoActiveFile)
                    .and_then(|file| self.start_job(file));
                let _ = reply.send(result);
            }
            EngineMsg::AddFile {
                name,
                kind,
                directory,
                content,
                reply,
            } => {
                let result =
                    self.session
                        .workspace_mut()
                        .add_named_file(&name, kind, &directory, content);
                if result.is_ok() {
                    self.touch(kind);
                }
                let _ = reply.send(result);
            }
            EngineMsg::AddDirectory {
                parent,
                name,
                reply,
            } => {
                let _ = reply.send(self.session.workspace_mut().add_directory(&parent, &name));
            }
            EngineMsg::Remove { file, reply } => {
                let _ = reply.send(self.handle_remove(file));
            }
            EngineMsg::SetStdin { file, input, reply } => {
                let _ = reply.send(self.session.set_stdin(file, input));
            }
            EngineMsg::Rename { file, name, reply } => {
                let result = self.session.workspace_mut().rename_file(file, &name);
                let _ = reply.send(result);
            }
            EngineMsg::Inspect(inspect) => inspect(&self.session),
            EngineMsg::Shutdown => {}
        }
    }

    // ------------------------------------------------------------------------
    // Local compilation
    // ------------------------------------------------------------------------

    fn handle_edit(&mut self, file: FileId, content: String) {
        let kind = match self.session.workspace_mut().update_content(file, content) {
            Ok(updated) => updated.kind,
            Err(e) => {
                log!("engine"; "edit dropped: {}", e);
                return;
            }
        };
        self.touch(kind);
    }

    /// Schedule a debounced recompile after a change to a `kind` file.
    fn touch(&mut self, kind: FileKind) {
        if kind.is_server_side() {
            debug!("engine"; "server script changed, waiting for rerun");
            return;
        }
        let token = self.session.issue_token();
        self.debouncer.schedule(token, Instant::now());
        debug!("engine"; "compile {} scheduled", token);
    }

    fn flush_debounced(&mut self) {
        if let Some(token) = self.debouncer.take_due(Instant::now()) {
            self.compile_now(token);
        }
    }

    fn compile_now(&mut self, token: RequestToken) {
        let result = self.session.compile_local(token);
        self.report_install(token, "compiled", result);
    }

    // ------------------------------------------------------------------------
    // Workspace changes
    // ------------------------------------------------------------------------

    fn handle_activate(&mut self, file: FileId) -> Result<(), WorkspaceError> {
        self.session.workspace_mut().set_active(file)?;

        let kind = self
            .session
            .workspace()
            .get(file)
            .map(|f| f.kind)
            .ok_or(WorkspaceError::UnknownFile(file))?;

        // Only a job that actually starts supersedes the pending compile
        if kind.is_server_side() {
            match self.start_job(file) {
                Ok(_) | Err(RerunError::AlreadyRunning(_)) => {}
                Err(e) => log!("engine"; "{}", e),
            }
        } else {
            self.debouncer.cancel();
            let token = self.session.issue_token();
            self.compile_now(token);
        }
        Ok(())
    }

    fn handle_remove(&mut self, file: FileId) -> Vec<FileId> {
        let before: Vec<(FileId, FileKind)> = self
            .session
            .workspace()
            .files()
            .iter()
            .map(|f| (f.id, f.kind))
            .collect();
        let removed = self.session.workspace_mut().remove_file(file);
        self.session.forget(&removed);

        for id in &removed {
            if let Some(job) = self.jobs.remove(id) {
                job.cancel.cancel();
            }
        }

        let client_side = before
            .iter()
            .find(|(id, kind)| removed.contains(id) && !kind.is_server_side());
        if let Some(&(_, kind)) = client_side {
            self.touch(kind);
        }
        removed
    }

    // ------------------------------------------------------------------------
    // Remote jobs
    // ------------------------------------------------------------------------

    /// Start a remote run of `file`.
    fn start_job(&mut self, file: FileId) -> Result<RequestToken, RerunError> {
        let target = self
            .session
            .workspace()
            .get(file)
            .ok_or(RerunError::UnknownFile(file))?;
        let path = target.path();
        if !target.kind.is_server_side() {
            return Err(RerunError::NotServerScript(path));
        }

        if let Some(running) = self.jobs.get(&file)
            && !running.state.borrow().is_terminal()
        {
            match self.session.config().remote.rerun {
                RerunPolicy::Reject => return Err(RerunError::AlreadyRunning(path)),
                RerunPolicy::Cancel => {
                    debug!("engine"; "cancel {} for rerun", running.token);
                    running.cancel.cancel();
                }
            }
        }

        let mut job = self
            .session
            .prepare_job(file)
            .ok_or(RerunError::UnknownFile(file))?;
        let language = job.language;
        let token = self.session.issue_token();
        self.debouncer.cancel();

        let state = job.subscribe();
        let cancel = CancellationToken::new();
        let settings = PollSettings::from(&self.session.config().remote);

        let service = Arc::clone(&self.service);
        let job_tx = self.job_tx.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let outcome = job.run(service.as_ref(), settings, &task_cancel).await;
            let _ = job_tx.send(JobFinished {
                file,
                token,
                outcome,
            });
        });

        log!("remote"; "running {} ({})", path, language.api_name());
        self.jobs.insert(
            file,
            RunningJob {
                token,
                cancel,
                state,
            },
        );
        Ok(token)
    }

    fn handle_finished(&mut self, done: JobFinished) {
        if self.jobs.get(&done.file).is_some_and(|j| j.token == done.token) {
            self.jobs.remove(&done.file);
        }

        let result = self.session.complete_job(done.token, done.outcome);
        self.report_install(done.token, "executed", result);
    }

    fn report_install(
        &self,
        token: RequestToken,
        verb: &str,
        result: Result<bool, AssemblyError>,
    ) {
        match result {
            Ok(false) => {}
            Ok(true) => {
                debug!("engine"; "installed {}", token);
                if !self.report {
                    return;
                }
                let Some(live) = self.session.live() else {
                    return;
                };
                let target = self
                    .session
                    .workspace()
                    .active()
                    .map(|f| f.path())
                    .unwrap_or_default();
                match live.error_summary() {
                    Some(error) => status_error(&format!("{verb}: {target}"), &error),
                    None => status_success(&format!("{verb}: {target} ({})", live.label())),
                }
            }
            Err(e) => {
                log!("error"; "{} {}: {}", verb, token, e);
                if self.report {
                    status_error("compile failed, previous output kept", &e.to_string());
                }
            }
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable sender side of the engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineMsg>,
}

impl EngineHandle {
    pub async fn edit(&self, file: FileId, content: impl Into<String>) -> Result<(), EngineError> {
        let content = content.into();
        self.tx
            .send(EngineMsg::Edit { file, content })
            .await
            .map_err(|_| EngineError::Closed)
    }

    pub async fn activate(&self, file: FileId) -> Result<(), EngineError> {
        Ok(self
            .request(|reply| EngineMsg::Activate { file, reply })
            .await??)
    }

    /// Rerun `file`, or the active file when `None`.
    pub async fn rerun(&self, file: Option<FileId>) -> Result<RequestToken, EngineError> {
        Ok(self.request(|reply| EngineMsg::Rerun { file, reply }).await??)
    }

    pub async fn add_file(
        &self,
        name: impl Into<String>,
        kind: FileKind,
        directory: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<FileId, EngineError> {
        let (name, directory, content) = (name.into(), directory.into(), content.into());
        Ok(self
            .request(|reply| EngineMsg::AddFile {
                name,
                kind,
                directory,
                content,
                reply,
            })
            .await??)
    }

    pub async fn add_directory(
        &self,
        parent: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Option<FileId>, EngineError> {
        let (parent, name) = (parent.into(), name.into());
        self.request(|reply| EngineMsg::AddDirectory {
            parent,
            name,
            reply,
        })
        .await
    }

    pub async fn remove(&self, file: FileId) -> Result<Vec<FileId>, EngineError> {
        self.request(|reply| EngineMsg::Remove { file, reply }).await
    }

    pub async fn rename(&self, file: FileId, name: impl Into<String>) -> Result<(), EngineError> {
        let name = name.into();
        Ok(self
            .request(|reply| EngineMsg::Rename { file, name, reply })
            .await??)
    }

    /// Standard input for later runs of `file`; `None` clears it.
    pub async fn set_stdin(&self, file: FileId, input: Option<String>) -> Result<(), EngineError> {
        Ok(self
            .request(|reply| EngineMsg::SetStdin { file, input, reply })
            .await??)
    }

    /// Evaluate `f` against the engine's session.
    pub async fn inspect<R, F>(&self, f: F) -> Result<R, EngineError>
    where
        R: Send + 'static,
        F: FnOnce(&Session) -> R + Send + 'static,
    {
        self.request(|reply| {
            EngineMsg::Inspect(Box::new(move |session: &Session| {
                let _ = reply.send(f(session));
            }))
        })
        .await
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(EngineMsg::Shutdown).await;
    }

    async fn request<T>(
        &self,
        msg: impl FnOnce(oneshot::Sender<T>) -> EngineMsg,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(msg(reply))
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }
}
