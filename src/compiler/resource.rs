//! Resource handles and the stores that back them.
//!
//! A handle is an ephemeral reference to in-memory content that can be
//! substituted into a rendered document. Handles are not `Clone` and
//! `release` consumes them, so a handle cannot be released twice.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::AssemblyError;
use crate::core::FileKind;

/// A live resource reference owned by exactly one artifact.
#[derive(PartialEq, Eq)]
pub struct ResourceHandle {
    id: u64,
    reference: String,
}

impl ResourceHandle {
    /// Reference to substitute into the document (URL or relative path).
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceHandle({})", self.reference)
    }
}

/// Allocation/release counters. Equal in steady state once nothing is live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub allocated: u64,
    pub released: u64,
}

impl ResourceStats {
    /// Handles allocated and not yet released.
    pub fn live(&self) -> u64 {
        self.allocated - self.released
    }
}

/// Engine-managed backing storage for resource handles.
pub trait ResourceStore: Send {
    /// Wrap `content` into a new handle.
    fn allocate(&mut self, content: &str, kind: FileKind) -> Result<ResourceHandle, AssemblyError>;

    /// Release a handle. The reference is invalid afterwards.
    fn release(&mut self, handle: ResourceHandle);

    fn stats(&self) -> ResourceStats;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Keeps resources in memory behind `blob:codepad/<id>` references.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: FxHashMap<u64, (&'static str, String)>,
    next_id: u64,
    stats: ResourceStats,
    /// Maximum number of live resources (None = unbounded)
    limit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse allocations once `limit` resources are live.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Content behind a reference, if it is still live.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        let id = reference.strip_prefix("blob:codepad/")?.parse().ok()?;
        self.entries.get(&id).map(|(_, content)| content.as_str())
    }
}

impl ResourceStore for MemoryStore {
    fn allocate(&mut self, content: &str, kind: FileKind) -> Result<ResourceHandle, AssemblyError> {
        if self.limit.is_some_and(|limit| self.entries.len() >= limit) {
            return Err(AssemblyError::Allocation {
                mime: kind.mime(),
                reason: format!("{} resources already live", self.entries.len()),
            });
        }

        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(id, (kind.mime(), content.to_string()));
        self.stats.allocated += 1;

        Ok(ResourceHandle {
            id,
            reference: format!("blob:codepad/{id}"),
        })
    }

    fn release(&mut self, handle: ResourceHandle) {
        if self.entries.remove(&handle.id).is_some() {
            self.stats.released += 1;
        }
    }

    fn stats(&self) -> ResourceStats {
        self.stats
    }
}

// ============================================================================
// Directory store
// ============================================================================

/// Writes each resource as a file so a browser opening the rendered
/// document from disk can resolve the references.
#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
    /// Prefix of references, relative to the rendered document
    url_prefix: String,
    next_id: u64,
    live: FxHashMap<u64, PathBuf>,
    stats: ResourceStats,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            next_id: 0,
            live: FxHashMap::default(),
            stats: ResourceStats::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ResourceStore for DirStore {
    fn allocate(&mut self, content: &str, kind: FileKind) -> Result<ResourceHandle, AssemblyError> {
        self.next_id += 1;
        let id = self.next_id;

        // Content hash keeps browsers from serving a stale cached copy
        let hash = blake3::hash(content.as_bytes()).to_hex();
        let file_name = format!("res-{id}-{}.{}", &hash.as_str()[..8], kind.extension());
        let path = self.dir.join(&file_name);

        fs::create_dir_all(&self.dir).map_err(|e| AssemblyError::Io(self.dir.clone(), e))?;
        fs::write(&path, content).map_err(|e| AssemblyError::Io(path.clone(), e))?;

        self.live.insert(id, path);
        self.stats.allocated += 1;

        Ok(ResourceHandle {
            id,
            reference: format!("{}/{file_name}", self.url_prefix),
        })
    }

    fn release(&mut self, handle: ResourceHandle) {
        let Some(path) = self.live.remove(&handle.id) else {
            return;
        };
        if let Err(e) = fs::remove_file(&path) {
            crate::debug!("resource"; "failed to remove {}: {}", path.display(), e);
        }
        self.stats.released += 1;
    }

    fn stats(&self) -> ResourceStats {
        self.stats
    }
}
