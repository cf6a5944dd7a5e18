//! FileSystem Actor
//!
//! Watches the project directory and mirrors changes into the engine as
//! workspace operations. The engine does its own debouncing; this side only
//! lets bursts of notify events settle so one save becomes one edit.
//!
//! ```text
//! Watcher → ChangeBuffer (settle + dedup) → correct_by_existence → EngineHandle
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::time::Instant;

use super::engine::EngineHandle;
use super::messages::EngineError;
use crate::core::FileKind;
use crate::workspace::project::{is_hidden, split_relative};
use crate::workspace::{DIRECTORY_MARKER, join_path};
use crate::{debug, log};

/// Quiet period before a burst of raw events is applied
const SETTLE_MS: u64 = 50;

/// Editor backup and swap files
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp") || name.ends_with('~')
}

/// What happened to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// FileSystem Actor - feeds disk changes to the engine
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    engine: EngineHandle,
    root: PathBuf,
    /// Paths never mirrored (output directory, config file)
    skip: Vec<PathBuf>,
}

impl FsActor {
    /// Start watching `root` immediately; events buffer until `run`.
    pub fn new(root: PathBuf, skip: Vec<PathBuf>, engine: EngineHandle) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            engine,
            root,
            skip,
        })
    }

    /// Run the actor event loop until the engine shuts down
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        let mirror = Mirror {
            engine: self.engine,
            root: self.root,
            skip: self.skip,
        };
        let mut buffer = ChangeBuffer::new();

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => buffer.add_event(&event, |p| mirror.is_ignored(p)),
                    None => break,
                },
                _ = tokio::time::sleep_until(buffer.deadline()) => {
                    let Some(changes) = buffer.take() else { continue };
                    if let Err(EngineError::Closed) = mirror.apply(changes).await {
                        break;
                    }
                }
            }
        }
        debug!("watch"; "stopped");
    }
}

// =============================================================================
// ChangeBuffer - pure timing and event deduplication
// =============================================================================

struct ChangeBuffer {
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

impl ChangeBuffer {
    fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Add a notify event:
    /// - Removed + Created/Modified → the new event (file restored)
    /// - Modified + Removed → Removed
    /// - Created + Removed → dropped
    /// - otherwise the first event wins
    fn add_event(&mut self, event: &notify::Event, ignored: impl Fn(&Path) -> bool) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) || ignored(path) {
                continue;
            }

            match (self.changes.get(path).copied(), kind) {
                (None, _) => {
                    self.changes.insert(path.clone(), kind);
                }
                (Some(ChangeKind::Removed), ChangeKind::Created | ChangeKind::Modified) => {
                    self.changes.insert(path.clone(), kind);
                }
                (Some(ChangeKind::Modified), ChangeKind::Removed) => {
                    self.changes.insert(path.clone(), ChangeKind::Removed);
                }
                (Some(ChangeKind::Created), ChangeKind::Removed) => {
                    self.changes.remove(path);
                }
                _ => continue,
            }
            self.last_event = Some(Instant::now());
        }
    }

    fn deadline(&self) -> Instant {
        match self.last_event {
            Some(at) => at + Duration::from_millis(SETTLE_MS),
            None => Instant::now() + Duration::from_secs(86400),
        }
    }

    fn take(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        self.last_event = None;
        let mut changes = std::mem::take(&mut self.changes);
        correct_by_existence(&mut changes);
        (!changes.is_empty()).then_some(changes)
    }
}

/// Reconcile event kinds with what is actually on disk.
///
/// Atomic saves can report Removed for a file that exists again, or
/// Created for one that is already gone.
fn correct_by_existence(changes: &mut FxHashMap<PathBuf, ChangeKind>) {
    changes.retain(|path, kind| {
        let exists = path.exists();
        match *kind {
            ChangeKind::Created if !exists => false,
            ChangeKind::Modified if !exists => {
                *kind = ChangeKind::Removed;
                true
            }
            ChangeKind::Removed if exists => {
                *kind = ChangeKind::Modified;
                true
            }
            _ => true,
        }
    });
}

// =============================================================================
// Mirror - apply changes as workspace operations
// =============================================================================

struct Mirror {
    engine: EngineHandle,
    root: PathBuf,
    skip: Vec<PathBuf>,
}

impl Mirror {
    fn is_ignored(&self, path: &Path) -> bool {
        is_hidden(&self.root, path) || self.skip.iter().any(|s| path.starts_with(s))
    }

    async fn apply(&self, changes: FxHashMap<PathBuf, ChangeKind>) -> Result<(), EngineError> {
        // Removals first so a rename's old path is gone before the new one lands
        let mut changes: Vec<_> = changes.into_iter().collect();
        changes.sort_by_key(|(path, kind)| (*kind != ChangeKind::Removed, path.clone()));

        for (path, kind) in changes {
            let Some((directory, name)) = split_relative(&self.root, &path) else {
                continue;
            };
            debug!("watch"; "{}: {}", kind.label(), path.display());

            let result = match kind {
                ChangeKind::Removed => self.removed(&directory, &name).await,
                ChangeKind::Created | ChangeKind::Modified if path.is_dir() => self
                    .engine
                    .add_directory(directory, name)
                    .await
                    .map(|_| ()),
                ChangeKind::Created | ChangeKind::Modified => {
                    self.written(&path, directory, name).await
                }
            };

            match result {
                Err(EngineError::Closed) => return Err(EngineError::Closed),
                Err(e) => log!("watch"; "{}: {}", path.display(), e),
                Ok(()) => {}
            }
        }
        Ok(())
    }

    async fn written(
        &self,
        path: &Path,
        directory: String,
        name: String,
    ) -> Result<(), EngineError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("watch"; "skip unreadable {}: {}", path.display(), e);
                return Ok(());
            }
        };

        let rel = join_path(&directory, &name);
        let probe = content.clone();
        let existing = self
            .engine
            .inspect(move |s| {
                s.workspace()
                    .find_by_path(&rel)
                    .map(|f| (f.id, f.content == probe))
            })
            .await?;

        match existing {
            Some((_, true)) => Ok(()),
            Some((id, false)) => self.engine.edit(id, content).await,
            None => self
                .engine
                .add_file(name, FileKind::from_path(path), directory, content)
                .await
                .map(|_| ()),
        }
    }

    async fn removed(&self, directory: &str, name: &str) -> Result<(), EngineError> {
        let rel = join_path(directory, name);
        let marker = join_path(&rel, DIRECTORY_MARKER);
        let target = self
            .engine
            .inspect(move |s| {
                let ws = s.workspace();
                ws.find_by_path(&rel)
                    .or_else(|| ws.find_by_path(&marker))
                    .map(|f| f.id)
            })
            .await?;

        if let Some(id) = target {
            self.engine.remove(id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.into_iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    fn modify_kind() -> notify::EventKind {
        notify::EventKind::Modify(notify::event::ModifyKind::Data(
            notify::event::DataChange::Any,
        ))
    }

    fn create_kind() -> notify::EventKind {
        notify::EventKind::Create(notify::event::CreateKind::File)
    }

    fn remove_kind() -> notify::EventKind {
        notify::EventKind::Remove(notify::event::RemoveKind::File)
    }

    fn keep_all(_: &Path) -> bool {
        false
    }

    #[test]
    fn test_dedup_rules() {
        let mut buffer = ChangeBuffer::new();

        buffer.add_event(&make_event(vec!["/p/a.html"], create_kind()), keep_all);
        buffer.add_event(&make_event(vec!["/p/a.html"], modify_kind()), keep_all);
        buffer.add_event(&make_event(vec!["/p/b.css"], modify_kind()), keep_all);
        buffer.add_event(&make_event(vec!["/p/b.css"], remove_kind()), keep_all);
        buffer.add_event(&make_event(vec!["/p/c.js"], create_kind()), keep_all);
        buffer.add_event(&make_event(vec!["/p/c.js"], remove_kind()), keep_all);

        assert_eq!(buffer.changes.len(), 2);
        assert_eq!(buffer.changes[&PathBuf::from("/p/a.html")], ChangeKind::Created);
        assert_eq!(buffer.changes[&PathBuf::from("/p/b.css")], ChangeKind::Removed);
    }

    #[test]
    fn test_temp_and_ignored_paths() {
        let mut buffer = ChangeBuffer::new();

        buffer.add_event(&make_event(vec!["/p/index.html~", "/p/x.swp"], modify_kind()), keep_all);
        buffer.add_event(&make_event(vec!["/p/public/index.html"], modify_kind()), |p| {
            p.starts_with("/p/public")
        });

        assert!(buffer.changes.is_empty());
        assert!(buffer.last_event.is_none());
    }

    #[test]
    fn test_correct_by_existence() {
        let temp = tempfile::tempdir().unwrap();
        let present = temp.path().join("present.css");
        std::fs::write(&present, "a{}").unwrap();
        let gone = temp.path().join("gone.css");

        let mut changes = FxHashMap::default();
        changes.insert(present.clone(), ChangeKind::Removed);
        changes.insert(gone.clone(), ChangeKind::Modified);
        changes.insert(temp.path().join("flash.css"), ChangeKind::Created);
        correct_by_existence(&mut changes);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[&present], ChangeKind::Modified);
        assert_eq!(changes[&gone], ChangeKind::Removed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_deadline() {
        let mut buffer = ChangeBuffer::new();
        assert!(buffer.take().is_none());

        let start = Instant::now();
        buffer.add_event(&make_event(vec!["/nonexistent/a.css"], modify_kind()), keep_all);
        assert_eq!(buffer.deadline(), start + Duration::from_millis(SETTLE_MS));
    }
}
