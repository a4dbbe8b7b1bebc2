//! Ordered registry of mounts

use crate::error::ServerError;
use crate::mount::{Hash, MountedDirectory, RequestMetadata};
use indexmap::IndexMap;

/// Mounts keyed by name, in registration order.
///
/// Order decides which mount wins when several eligible mounts hold a file
/// with the same relative path. The registry is built once at startup and
/// only read afterwards.
#[derive(Debug, Default)]
pub struct MountRegistry {
    mounts: IndexMap<String, MountedDirectory>,
}

impl MountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mount. Names must be unique.
    pub fn register(&mut self, mount: MountedDirectory) -> Result<(), ServerError> {
        if self.mounts.contains_key(mount.name()) {
            return Err(ServerError::DuplicateMount(mount.name().to_string()));
        }
        self.mounts.insert(mount.name().to_string(), mount);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MountedDirectory> {
        self.mounts.get(name)
    }

    /// Mounts in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MountedDirectory> {
        self.mounts.values()
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// First eligible mount, in order, holding a hashable file at `relative`.
    pub fn resolve_hash(
        &self,
        relative: &str,
        metadata: &RequestMetadata,
    ) -> Option<(&MountedDirectory, Hash)> {
        self.iter()
            .filter(|mount| mount.is_eligible(metadata))
            .find_map(|mount| mount.get_file_hash(relative).map(|hash| (mount, hash)))
    }
}
