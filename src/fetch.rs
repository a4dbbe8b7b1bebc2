//! Confined single-file retrieval

use crate::mount::{path, MountRegistry};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Extension of distributed configuration files.
pub const DEFAULT_EXTENSION: &str = "txt";

/// An open file ready to be streamed to the client.
#[derive(Debug)]
pub struct ResolvedFile {
    /// Canonical path on disk
    pub path: PathBuf,
    /// Name of the mount the file was resolved through
    pub mount: String,
    pub len: u64,
    pub file: File,
}

/// Maps `<mount>/<relative path>` requests onto files inside that mount.
#[derive(Debug, Clone)]
pub struct PathResolver {
    registry: Arc<MountRegistry>,
    extension: String,
}

impl PathResolver {
    pub fn new(registry: Arc<MountRegistry>) -> Self {
        Self::with_extension(registry, DEFAULT_EXTENSION)
    }

    pub fn with_extension(registry: Arc<MountRegistry>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            registry,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Resolve and open a requested path.
    ///
    /// Unknown mounts, paths escaping the mount root, missing files,
    /// non-regular files and the wrong extension all come back as the same
    /// `None`, so callers cannot tell a traversal attempt from a missing file.
    pub fn resolve(&self, requested: &str) -> Option<ResolvedFile> {
        let requested = requested.trim_start_matches('/');
        let (mount_name, remainder) = requested.split_once('/')?;
        if remainder.is_empty() {
            return None;
        }

        let Some(mount) = self.registry.get(mount_name) else {
            debug!(mount = %mount_name, "Fetch for unknown mount");
            return None;
        };

        let target = mount.root().join(remainder);
        let Some(canonical) = path::confine(mount.root(), &target) else {
            debug!(mount = %mount_name, path = %remainder, "Fetch did not resolve inside mount");
            return None;
        };

        if !self.has_allowed_extension(&canonical) {
            debug!(path = %canonical.display(), "Fetch for disallowed extension");
            return None;
        }

        let metadata = std::fs::metadata(&canonical).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let file = File::open(&canonical).ok()?;

        Some(ResolvedFile {
            path: canonical,
            mount: mount.name().to_string(),
            len: metadata.len(),
            file,
        })
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext == self.extension.as_str())
            .unwrap_or(false)
    }
}
