//! `codepad watch`: the engine, a file watcher and a stdin command loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::common::{Project, RESOURCE_DIR};
use crate::actor::{EngineActor, EngineError, EngineHandle, FsActor, Session};
use crate::compiler::DirStore;
use crate::remote::PaizaClient;
use crate::surface::FileSurface;
use crate::workspace::FileId;
use crate::{debug, log};

/// One line typed on stdin.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Open(String),
    Run(Option<String>),
    /// Read stdin for the active script from a file; no path clears it
    Stdin(Option<String>),
    List,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, Some(arg.trim().to_string())),
            None => (line, None),
        };

        match (verb, arg) {
            ("", _) => Self::Empty,
            ("open" | "o", Some(path)) => Self::Open(path),
            ("run" | "r", path) => Self::Run(path),
            ("stdin", path) => Self::Stdin(path),
            ("ls" | "list", None) => Self::List,
            ("quit" | "q" | "exit", None) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Run until `quit`. Exits only on an engine failure otherwise.
pub async fn watch_project(project: Project) -> Result<()> {
    let Project { config, workspace } = project;
    let output = config.output_dir();
    let root = config.root.clone();

    let service = PaizaClient::new(&config.remote).context("failed to create HTTP client")?;
    let session = Session::new(
        workspace,
        Arc::clone(&config),
        Box::new(FileSurface::new(&output)),
        Box::new(DirStore::new(output.join(RESOURCE_DIR), RESOURCE_DIR)),
    );
    let active = session.workspace().active_id();

    let (engine, handle) = EngineActor::new(session, Arc::new(service));
    let engine = tokio::spawn(engine.with_status().run());

    // Start watching before the first compile so no change is missed
    let fs = FsActor::new(root.clone(), Project::skipped(&config), handle.clone())
        .context("failed to start file watcher")?;
    tokio::spawn(fs.run());

    if let Some(id) = active {
        handle.activate(id).await?;
    }

    log!("watch"; "watching {} (open <path>, run [path], stdin [file], ls, quit)", root.display());
    read_commands(&handle).await?;

    handle.shutdown().await;
    let session = engine.await.context("engine task failed")?;
    debug!("watch"; "resources {:?}", session.stats());
    Ok(())
}

async fn read_commands(handle: &EngineHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let result = match Command::parse(&line) {
            Command::Quit => return Ok(()),
            Command::Empty => Ok(()),
            Command::Open(path) => open(handle, &path).await,
            Command::Run(path) => run(handle, path.as_deref()).await,
            Command::Stdin(path) => stdin(handle, path.as_deref()).await,
            Command::List => list(handle).await,
            Command::Unknown(line) => {
                log!("watch"; "unknown command `{}`", line);
                Ok(())
            }
        };

        match result {
            Err(EngineError::Closed) => anyhow::bail!("engine stopped"),
            Err(e) => log!("error"; "{}", e),
            Ok(()) => {}
        }
    }

    // stdin closed (not a terminal); keep watching until interrupted
    debug!("watch"; "stdin closed");
    std::future::pending::<()>().await;
    Ok(())
}

async fn find(handle: &EngineHandle, path: &str) -> Result<Option<FileId>, EngineError> {
    let path = path.to_string();
    let found = handle
        .inspect(move |s| s.workspace().find_by_path(&path).map(|f| f.id))
        .await?;
    Ok(found)
}

async fn open(handle: &EngineHandle, path: &str) -> Result<(), EngineError> {
    match find(handle, path).await? {
        Some(id) => handle.activate(id).await,
        None => {
            log!("watch"; "no file `{}`", path);
            Ok(())
        }
    }
}

async fn run(handle: &EngineHandle, path: Option<&str>) -> Result<(), EngineError> {
    let file = match path {
        Some(path) => match find(handle, path).await? {
            Some(id) => Some(id),
            None => {
                log!("watch"; "no file `{}`", path);
                return Ok(());
            }
        },
        None => None,
    };
    let token = handle.rerun(file).await?;
    debug!("watch"; "run scheduled as {}", token);
    Ok(())
}

async fn stdin(handle: &EngineHandle, path: Option<&str>) -> Result<(), EngineError> {
    let Some(active) = handle.inspect(|s| s.workspace().active_id()).await? else {
        log!("watch"; "no active file");
        return Ok(());
    };
    let input = match path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(input) => Some(input),
            Err(e) => {
                log!("watch"; "cannot read `{}`: {}", path, e);
                return Ok(());
            }
        },
        None => None,
    };
    handle.set_stdin(active, input).await
}

async fn list(handle: &EngineHandle) -> Result<(), EngineError> {
    let lines = handle
        .inspect(|s| {
            let ws = s.workspace();
            let active = ws.active_id();
            ws.files()
                .iter()
                .filter(|f| !f.is_marker())
                .map(|f| {
                    let mark = if Some(f.id) == active { "*" } else { " " };
                    format!("{mark} {:<10} {}", f.kind.name(), f.path())
                })
                .collect::<Vec<_>>()
        })
        .await?;

    for line in lines {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("open src/index.html"),
            Command::Open("src/index.html".to_string())
        );
        assert_eq!(Command::parse("  run  "), Command::Run(None));
        assert_eq!(
            Command::parse("run api/form.php"),
            Command::Run(Some("api/form.php".to_string()))
        );
        assert_eq!(
            Command::parse("stdin cases/1.txt"),
            Command::Stdin(Some("cases/1.txt".to_string()))
        );
        assert_eq!(Command::parse("stdin"), Command::Stdin(None));
        assert_eq!(Command::parse("ls"), Command::List);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse(""), Command::Empty);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse("open"), Command::Unknown("open".to_string()));
        assert_eq!(
            Command::parse("build now"),
            Command::Unknown("build now".to_string())
        );
        assert_eq!(Command::parse("ls -la"), Command::Unknown("ls -la".to_string()));
    }
}
