//! Enumerates the regular files below a mount root

use crate::mount::path;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A regular file found below a mount root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountFile {
    /// Posix-form path relative to the root
    pub relative: String,
    /// Absolute path on disk
    pub path: PathBuf,
    pub size: u64,
}

/// Collect every regular file below `root`, sorted by relative path.
///
/// Symlinks are followed but confined like client lookups: a link whose
/// target canonicalizes outside the root is skipped, and so is any directory
/// reached through one. Entries that cannot be read are skipped, so a single
/// unreadable subdirectory never hides the rest of the mount.
pub fn walk_files(root: &Path) -> Vec<MountFile> {
    let mut files = Vec::new();
    let canonical_root = match path::canonicalize_path(root) {
        Ok(canonical) => canonical,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "Cannot walk missing root");
            return files;
        }
    };

    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.path_is_symlink()
                || path::confine(&canonical_root, entry.path()).is_some()
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if path::confine(&canonical_root, entry.path()).is_none() {
            debug!(path = %entry.path().display(), "Skipping file resolving outside root");
            continue;
        }

        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => continue,
        };
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

        files.push(MountFile {
            relative,
            path: entry.path().to_path_buf(),
            size,
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    files
}
