//! Session context: everything the engine owns, in one place.
//!
//! The engine actor is the only holder of a `Session`, so the surface and
//! the resource store have exactly one writer. Pipeline and client code
//! receive what they need from here as explicit arguments.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::compiler::{
    AssemblyError, CompiledArtifact, Document, ResourceStats, ResourceStore, assemble,
};
use crate::config::CodepadConfig;
use crate::core::{FileKind, RequestToken, TokenCounter};
use crate::remote::{
    Classified, JobResult, Language, RemoteError, RemoteExecutionJob, classify, failure_report,
    splice_style,
};
use crate::surface::Surface;
use crate::utils::html::find_head_close;
use crate::workspace::{FileId, Workspace, WorkspaceError};
use crate::{debug, log};

pub struct Session {
    workspace: Workspace,
    config: Arc<CodepadConfig>,
    surface: Box<dyn Surface>,
    store: Box<dyn ResourceStore>,
    tokens: TokenCounter,
    /// Installed artifact and the token it was scheduled with
    live: Option<(RequestToken, CompiledArtifact)>,
    /// Standard input sent with each run of a server script
    stdin: FxHashMap<FileId, String>,
}

impl Session {
    pub fn new(
        workspace: Workspace,
        config: Arc<CodepadConfig>,
        surface: Box<dyn Surface>,
        store: Box<dyn ResourceStore>,
    ) -> Self {
        Self {
            workspace,
            config,
            surface,
            store,
            tokens: TokenCounter::new(),
            live: None,
            stdin: FxHashMap::default(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn workspace_mut(&mut self) -> &mut Workspace {
        &mut self.workspace
    }

    pub fn config(&self) -> &CodepadConfig {
        &self.config
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub fn live(&self) -> Option<&CompiledArtifact> {
        self.live.as_ref().map(|(_, artifact)| artifact)
    }

    pub fn live_token(&self) -> Option<RequestToken> {
        self.live.as_ref().map(|(token, _)| *token)
    }

    pub fn stats(&self) -> ResourceStats {
        self.store.stats()
    }

    pub fn latest_token(&self) -> Option<RequestToken> {
        self.tokens.latest()
    }

    /// Issue a token for a newly scheduled compilation or job.
    pub fn issue_token(&mut self) -> RequestToken {
        self.tokens.issue()
    }

    // ------------------------------------------------------------------------
    // Installation
    // ------------------------------------------------------------------------

    /// Install `artifact` if `token` is still the latest.
    ///
    /// Returns `Ok(false)` for a stale result. On success the previous
    /// artifact's handles are released; if rendering fails the new handles
    /// are released instead and the previous artifact stays live.
    pub fn install(
        &mut self,
        token: RequestToken,
        artifact: CompiledArtifact,
    ) -> Result<bool, AssemblyError> {
        if !self.tokens.is_latest(token) {
            debug!("engine"; "discard stale {} {}", artifact.label(), token);
            artifact.release(self.store.as_mut());
            return Ok(false);
        }

        if let Err(e) = artifact.render(self.surface.as_mut()) {
            artifact.release(self.store.as_mut());
            return Err(AssemblyError::Render(e));
        }

        if let Some((_, previous)) = self.live.replace((token, artifact)) {
            previous.release(self.store.as_mut());
        }
        Ok(true)
    }

    /// Assemble the workspace and install the document.
    ///
    /// A stale token is dropped before anything is allocated.
    pub fn compile_local(&mut self, token: RequestToken) -> Result<bool, AssemblyError> {
        if !self.tokens.is_latest(token) {
            debug!("engine"; "skip stale compile {}", token);
            return Ok(false);
        }

        let document = assemble(&self.workspace, self.store.as_mut(), &self.config.compile)?;
        self.install(token, CompiledArtifact::Document(document))
    }

    /// Install the outcome of a remote job.
    ///
    /// Cancelled jobs and stale tokens install nothing.
    pub fn complete_job(
        &mut self,
        token: RequestToken,
        outcome: Result<JobResult, RemoteError>,
    ) -> Result<bool, AssemblyError> {
        if !self.tokens.is_latest(token) {
            debug!("engine"; "discard stale job result {}", token);
            return Ok(false);
        }

        let artifact = match outcome {
            Ok(result) => match classify(&result) {
                Classified::Document(html) => CompiledArtifact::Document(self.styled(html)),
                Classified::Report(report) => CompiledArtifact::Diagnostics(report),
            },
            Err(error) => match failure_report(&error) {
                Some(report) => CompiledArtifact::Diagnostics(report),
                None => return Ok(false),
            },
        };

        self.install(token, artifact)
    }

    /// Link the workspace stylesheet into a script-generated document.
    ///
    /// Nothing is allocated when the document has no `</head>` to link from.
    fn styled(&mut self, html: String) -> Document {
        let Some(style) = self.workspace.first_of_kind(FileKind::Style) else {
            return Document::new(html);
        };
        if find_head_close(&html).is_none() {
            debug!("engine"; "no </head> in script output, stylesheet not linked");
            return Document::new(html);
        }

        match self.store.allocate(&style.content, FileKind::Style) {
            Ok(handle) => Document {
                html: splice_style(&html, handle.reference()),
                resources: vec![handle],
            },
            Err(e) => {
                log!("engine"; "stylesheet not linked: {}", e);
                Document::new(html)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Remote jobs
    // ------------------------------------------------------------------------

    /// Job for `file`: source with preamble, harvested form inputs,
    /// configured modules and the file's standard input.
    pub fn prepare_job(&self, file: FileId) -> Option<RemoteExecutionJob> {
        let entry = self.workspace.get(file)?;
        let language = Language::from_path(&entry.name).unwrap_or(self.config.remote.language);
        let bindings = self.surface.form_inputs();
        debug!("remote"; "{}: {} form bindings", entry.path(), bindings.len());

        let source = language.prepare(&entry.content, &bindings, &self.config.remote.modules);
        let job = RemoteExecutionJob::new(source, language);
        Some(match self.stdin.get(&file) {
            Some(input) => job.with_stdin(input.as_str()),
            None => job,
        })
    }

    /// Standard input for future runs of `file`; `None` clears it.
    pub fn set_stdin(&mut self, file: FileId, input: Option<String>) -> Result<(), WorkspaceError> {
        if self.workspace.get(file).is_none() {
            return Err(WorkspaceError::UnknownFile(file));
        }
        match input {
            Some(input) => self.stdin.insert(file, input),
            None => self.stdin.remove(&file),
        };
        Ok(())
    }

    pub fn stdin(&self, file: FileId) -> Option<&str> {
        self.stdin.get(&file).map(String::as_str)
    }

    /// Drop per-file state of removed files.
    pub fn forget(&mut self, removed: &[FileId]) {
        for id in removed {
            self.stdin.remove(id);
        }
    }

    /// Release the live artifact. Called once on shutdown.
    pub fn close(&mut self) {
        if let Some((_, artifact)) = self.live.take() {
            artifact.release(self.store.as_mut());
        }
    }
}
