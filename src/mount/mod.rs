//! Mounted content directories
//!
//! A mount binds a logical namespace (the first component of every location
//! handed to clients) to a physical directory, with an optional eligibility
//! rule deciding which clients it may serve.

pub mod cache;
pub mod eligibility;
pub mod hasher;
pub mod path;
pub mod registry;
pub mod walker;

pub use cache::{ContentHashCache, HashCacheEntry};
pub use eligibility::{Eligibility, RequestMetadata, Version};
pub use hasher::{ContentSource, Hash, LocalFs};
pub use registry::MountRegistry;

use crate::error::ServerError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A named physical root plus its eligibility rule and hash cache.
#[derive(Debug)]
pub struct MountedDirectory {
    name: String,
    root: PathBuf,
    eligibility: Eligibility,
    cache: ContentHashCache,
}

impl MountedDirectory {
    /// Mount `root` under `name`.
    ///
    /// The root is canonicalized once here and never changes afterwards. Fails
    /// if it is missing or not a directory.
    pub fn new(
        name: impl Into<String>,
        root: impl AsRef<Path>,
        eligibility: Eligibility,
    ) -> Result<Self, ServerError> {
        Self::with_cache(name, root, eligibility, ContentHashCache::new())
    }

    /// Mount with a cache reading through a custom content source.
    pub fn with_source(
        name: impl Into<String>,
        root: impl AsRef<Path>,
        eligibility: Eligibility,
        source: Arc<dyn ContentSource>,
    ) -> Result<Self, ServerError> {
        Self::with_cache(name, root, eligibility, ContentHashCache::with_source(source))
    }

    fn with_cache(
        name: impl Into<String>,
        root: impl AsRef<Path>,
        eligibility: Eligibility,
        cache: ContentHashCache,
    ) -> Result<Self, ServerError> {
        let name = name.into();
        validate_mount_name(&name)?;

        let raw_root = root.as_ref();
        let root = match path::canonicalize_path(raw_root) {
            Ok(root) if root.is_dir() => root,
            _ => {
                return Err(ServerError::MountRootMissing {
                    name,
                    path: raw_root.to_path_buf(),
                })
            }
        };

        Ok(Self {
            name,
            root,
            eligibility,
            cache,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical physical root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn eligibility(&self) -> &Eligibility {
        &self.eligibility
    }

    pub fn cache(&self) -> &ContentHashCache {
        &self.cache
    }

    pub fn is_eligible(&self, metadata: &RequestMetadata) -> bool {
        self.eligibility.is_eligible(metadata)
    }

    /// Hash of the file at posix-form `relative` below this mount.
    ///
    /// The resolved path must canonicalize to somewhere strictly inside the
    /// root; anything else, including symlinks pointing out of the mount, is
    /// reported as absent.
    pub fn get_file_hash(&self, relative: &str) -> Option<Hash> {
        let target = self.root.join(path::relative_to_path(relative));
        let canonical = match path::canonicalize_path(&target) {
            Ok(canonical) => canonical,
            Err(_) => return None,
        };
        if !path::is_strictly_within(&self.root, &canonical) {
            warn!(
                mount = %self.name,
                relative = %relative,
                "Rejected path resolving outside mount root"
            );
            return None;
        }
        self.cache.hash_of(relative, &canonical)
    }

    /// Hash every regular file below the root, returning how many were hashed.
    pub fn warm(&self) -> usize {
        let mut hashed = 0;
        for file in walker::walk_files(&self.root) {
            if self.get_file_hash(&file.relative).is_some() {
                hashed += 1;
            }
        }
        debug!(mount = %self.name, files = hashed, "Warmed hash cache");
        hashed
    }
}

/// Mount names become the first path component of client locations.
pub fn validate_mount_name(name: &str) -> Result<(), ServerError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        Err(ServerError::InvalidMountName(name.to_string()))
    } else {
        Ok(())
    }
}
