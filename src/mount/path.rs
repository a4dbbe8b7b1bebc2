//! Path canonicalization and confinement utilities

use std::io;
use std::path::{Path, PathBuf};

/// Canonicalize a path: resolve symlinks, `..` and `.`, and make it absolute.
///
/// Uses dunce so Windows results stay free of `\\?\` prefixes and compare
/// cleanly against configured roots.
pub fn canonicalize_path(path: &Path) -> io::Result<PathBuf> {
    dunce::canonicalize(path)
}

/// True when `candidate` lies strictly inside `root`.
///
/// Both paths must already be canonical. The comparison is component-wise, so
/// `/srv/mount-other` is not inside `/srv/mount`, and the root itself is not
/// inside itself.
pub fn is_strictly_within(root: &Path, candidate: &Path) -> bool {
    candidate != root && candidate.starts_with(root)
}

/// Canonicalize `candidate` and confirm it stays strictly inside `root`.
///
/// Returns `None` for missing paths and for paths escaping the root.
pub fn confine(root: &Path, candidate: &Path) -> Option<PathBuf> {
    let canonical = canonicalize_path(candidate).ok()?;
    is_strictly_within(root, &canonical).then_some(canonical)
}

/// Normalize a client-supplied relative path to posix form.
///
/// Accepts `/` and `\` as separators and drops empty and `.` components.
/// Returns `None` for paths with `..` components or nothing left after
/// normalization.
pub fn normalize_relative(path: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => return None,
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Convert a posix relative path into a platform path.
pub fn relative_to_path(relative: &str) -> PathBuf {
    relative.split('/').collect()
}
