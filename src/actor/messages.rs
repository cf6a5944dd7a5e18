//! Actor Message Definitions
//!
//! ```text
//! FsActor / stdin --EngineMsg--> EngineActor --spawn--> job task
//!                                    ^                      |
//!                                    +----- JobFinished ----+
//! ```

use thiserror::Error;
use tokio::sync::oneshot;

use super::session::Session;
use crate::core::{FileKind, RequestToken};
use crate::remote::{JobResult, RemoteError};
use crate::workspace::{FileId, WorkspaceError};

/// Read-only access to the session, run on the engine task.
pub type Inspector = Box<dyn FnOnce(&Session) + Send>;

// =============================================================================
// EngineActor Messages
// =============================================================================

/// Messages to the Engine Actor
pub enum EngineMsg {
    /// Content changed in the editing surface
    Edit { file: FileId, content: String },
    /// Switch the active file; compiles immediately
    Activate {
        file: FileId,
        reply: oneshot::Sender<Result<(), WorkspaceError>>,
    },
    /// Execute a server script again (`None` = the active file)
    Rerun {
        file: Option<FileId>,
        reply: oneshot::Sender<Result<RequestToken, RerunError>>,
    },
    /// Add a named file
    AddFile {
        name: String,
        kind: FileKind,
        directory: String,
        content: String,
        reply: oneshot::Sender<Result<FileId, WorkspaceError>>,
    },
    /// Add an (empty) directory
    AddDirectory {
        parent: String,
        name: String,
        reply: oneshot::Sender<Option<FileId>>,
    },
    /// Remove a file, or a directory subtree when given its marker
    Remove {
        file: FileId,
        reply: oneshot::Sender<Vec<FileId>>,
    },
    /// Set or clear the standard input sent with runs of a server script
    SetStdin {
        file: FileId,
        input: Option<String>,
        reply: oneshot::Sender<Result<(), WorkspaceError>>,
    },
    Rename {
        file: FileId,
        name: String,
        reply: oneshot::Sender<Result<(), WorkspaceError>>,
    },
    /// Run a closure against the current session state
    Inspect(Inspector),
    Shutdown,
}

/// Sent by a job task when its job reaches a terminal state.
#[derive(Debug)]
pub struct JobFinished {
    pub file: FileId,
    pub token: RequestToken,
    pub outcome: Result<JobResult, RemoteError>,
}

// =============================================================================
// Errors
// =============================================================================

/// Why a rerun request was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RerunError {
    #[error("no file with id {0}")]
    UnknownFile(FileId),

    #[error("no active file")]
    NoActiveFile,

    #[error("`{0}` is not a server script")]
    NotServerScript(String),

    #[error("`{0}` is already running")]
    AlreadyRunning(String),
}

/// Errors surfaced through `EngineHandle`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("engine has shut down")]
    Closed,

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Rerun(#[from] RerunError),
}
