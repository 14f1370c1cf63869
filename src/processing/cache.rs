//! Change cache: skips re-encoding sources that have not changed since they
//! were last processed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// Last-seen stat values for one source file.
///
/// An entry is reusable only while both fields are bit-for-bit equal to the
/// current file's stat values; any mismatch is a miss, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub size: u64,
    pub mtime: SystemTime,
}

impl CacheEntry {
    /// Snapshot of the stat values the cache compares on. `None` when the
    /// filesystem does not report a modification time (treated as a miss).
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Option<Self> {
        let mtime = metadata.modified().ok()?;
        Some(Self { size: metadata.len(), mtime })
    }
}

/// Injectable cache abstraction keyed by absolute source path.
///
/// Implementations must be shareable across the concurrent per-asset tasks
/// of one wave. The default lives for a single pipeline invocation; a
/// persistent backing can be swapped in without touching the decision policy.
pub trait ChangeCache: Send + Sync {
    fn get(&self, key: &Path) -> Option<CacheEntry>;
    fn put(&self, key: &Path, entry: CacheEntry);
}

/// Default in-memory cache. No cross-invocation persistence.
#[derive(Debug, Default)]
pub struct InMemoryChangeCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

impl InMemoryChangeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeCache for InMemoryChangeCache {
    fn get(&self, key: &Path) -> Option<CacheEntry> {
        self.entries
            .lock()
            .map(|entries| entries.get(key).copied())
            .unwrap_or(None)
    }

    fn put(&self, key: &Path, entry: CacheEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_path_buf(), entry);
        }
    }
}
