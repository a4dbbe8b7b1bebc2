//! Per-mount content hash cache keyed on modification time

use crate::mount::hasher::{self, ContentSource, Hash, LocalFs};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Cached hash state for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashCacheEntry {
    /// Modification time observed when the hash was computed
    pub mod_time: SystemTime,
    /// Hash of the contents, `None` when reading failed
    pub hash: Option<Hash>,
}

type Slot = Arc<Mutex<Option<HashCacheEntry>>>;

/// Read-through cache from a mount-relative path to its content hash.
///
/// Entries are never evicted. A slot lock is held while an entry is checked and
/// recomputed, so two requests racing on the same stale file read it once.
pub struct ContentHashCache {
    source: Arc<dyn ContentSource>,
    entries: Mutex<HashMap<String, Slot>>,
}

impl ContentHashCache {
    /// Create a cache that reads from the local filesystem.
    pub fn new() -> Self {
        Self::with_source(Arc::new(LocalFs))
    }

    /// Create a cache over a custom content source.
    pub fn with_source(source: Arc<dyn ContentSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Hash of the file at `path`, cached under `key`.
    ///
    /// The file is stat'ed on every call. Contents are read only when no entry
    /// exists, the entry has no hash, or the file's modification time is newer
    /// than the one recorded. Missing and unreadable files yield `None`.
    pub fn hash_of(&self, key: &str, path: &Path) -> Option<Hash> {
        let modified = match self.source.modified(path) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat file; treating as absent");
                return None;
            }
        };

        let slot = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(key.to_string()).or_default())
        };
        let mut entry = slot.lock();

        if let Some(cached) = entry.as_ref() {
            if cached.mod_time >= modified {
                if let Some(hash) = &cached.hash {
                    return Some(hash.clone());
                }
            }
        }

        let hash = self.compute(path);
        *entry = Some(HashCacheEntry {
            mod_time: modified,
            hash: hash.clone(),
        });
        hash
    }

    /// Snapshot of the entry stored under `key`.
    pub fn entry(&self, key: &str) -> Option<HashCacheEntry> {
        let slot = self.entries.lock().get(key).cloned()?;
        let entry = slot.lock().clone();
        entry
    }

    /// Number of keys with a slot in the cache.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn compute(&self, path: &Path) -> Option<Hash> {
        let result = self
            .source
            .open(path)
            .and_then(|mut reader| hasher::hash_reader(&mut reader));
        match result {
            Ok(hash) => {
                debug!(path = %path.display(), hash = %hash, "Computed content hash");
                Some(hash)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to hash file; treating as absent");
                None
            }
        }
    }
}

impl Default for ContentHashCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContentHashCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHashCache")
            .field("entries", &self.len())
            .finish()
    }
}
