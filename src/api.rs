//! Service API
//!
//! Transport-independent surface of the update server. `GameConfService`
//! owns the mount registry and exposes the two client operations: computing a
//! change-set from submitted hashes and resolving a single file for download.
//! The HTTP layer in `server` only decodes requests and encodes responses.

use crate::config::GameConfConfig;
use crate::diff::{ChangeSet, DiffRequest, DiffResolver, RequestFields};
use crate::error::{RequestError, ServerError};
use crate::fetch::{PathResolver, ResolvedFile};
use crate::mount::{MountRegistry, MountedDirectory, RequestMetadata, Version};
use crate::vdf::Document;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Section naming changed files in a successful response.
pub const CHANGED_SECTION: &str = "Changed";
/// Section carrying the error message in a rejected response.
pub const ERRORS_SECTION: &str = "Errors";

/// Range of client versions allowed to request diffs: `[min, max)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPolicy {
    pub min: Option<Version>,
    pub max: Option<Version>,
}

impl VersionPolicy {
    pub fn new(min: Option<Version>, max: Option<Version>) -> Self {
        Self { min, max }
    }

    /// Whether any bound is configured.
    pub fn is_restricted(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    /// Check the declared client version. Without bounds every request passes;
    /// with bounds an unparseable version is rejected.
    pub fn check(&self, metadata: &RequestMetadata) -> Result<(), RequestError> {
        if !self.is_restricted() {
            return Ok(());
        }
        let version = metadata.version().ok_or(RequestError::UnsupportedVersion)?;
        if let Some(min) = &self.min {
            if &version < min {
                return Err(RequestError::UnsupportedVersion);
            }
        }
        if let Some(max) = &self.max {
            if &version >= max {
                return Err(RequestError::UnsupportedVersion);
            }
        }
        Ok(())
    }
}

/// Outcome of a diff request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffResponse {
    Changed(ChangeSet),
    Errors(RequestError),
}

impl DiffResponse {
    /// KeyValues document sent back to the client.
    pub fn to_document(&self) -> Document {
        let mut root = Document::new();
        match self {
            DiffResponse::Changed(changes) => {
                let mut changed = Document::new();
                for (path, entry) in changes {
                    let mut file = Document::new();
                    file.insert_value("md5sum", entry.hash.clone());
                    file.insert_value("location", entry.location.clone());
                    changed.insert_section(path.clone(), file);
                }
                root.insert_section(CHANGED_SECTION, changed);
            }
            DiffResponse::Errors(error) => {
                let mut errors = Document::new();
                errors.insert_value("error", error.to_string());
                root.insert_section(ERRORS_SECTION, errors);
            }
        }
        root
    }

    /// Rendered response body.
    pub fn to_body(&self) -> String {
        self.to_document().to_pretty_string()
    }
}

/// The update service shared by all request handlers.
#[derive(Debug, Clone)]
pub struct GameConfService {
    registry: Arc<MountRegistry>,
    diff: DiffResolver,
    fetch: PathResolver,
    versions: VersionPolicy,
}

impl GameConfService {
    /// Build the service around an existing registry with default settings.
    pub fn new(registry: MountRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            diff: DiffResolver::new(Arc::clone(&registry)),
            fetch: PathResolver::new(Arc::clone(&registry)),
            registry,
            versions: VersionPolicy::default(),
        }
    }

    /// Replace the gamedata prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.diff = DiffResolver::with_prefix(Arc::clone(&self.registry), prefix);
        self
    }

    /// Replace the served file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.fetch = PathResolver::with_extension(Arc::clone(&self.registry), extension);
        self
    }

    pub fn with_version_policy(mut self, versions: VersionPolicy) -> Self {
        self.versions = versions;
        self
    }

    /// Mount every configured directory in order and apply protocol settings.
    pub fn from_config(config: &GameConfConfig) -> Result<Self, ServerError> {
        let mut registry = MountRegistry::new();
        for mount in &config.mounts {
            let root = config.mount_root(mount);
            let mounted = MountedDirectory::new(&mount.name, &root, mount.eligibility())?;
            info!(
                mount = %mounted.name(),
                root = %mounted.root().display(),
                eligibility = %mounted.eligibility(),
                "Mounted directory"
            );
            registry.register(mounted)?;
        }

        Ok(Self::new(registry)
            .with_prefix(config.diff.prefix.clone())
            .with_extension(config.fetch.extension.clone())
            .with_version_policy(VersionPolicy::new(
                config.diff.min_version.clone(),
                config.diff.max_version.clone(),
            )))
    }

    pub fn registry(&self) -> &MountRegistry {
        &self.registry
    }

    pub fn version_policy(&self) -> &VersionPolicy {
        &self.versions
    }

    /// Hash every file in every mount. Returns the number of files hashed.
    pub fn warm(&self) -> usize {
        let total: usize = self.registry.iter().map(MountedDirectory::warm).sum();
        info!(files = total, mounts = self.registry.len(), "Hash cache warmed");
        total
    }

    /// Answer a diff request from its decoded form fields.
    pub fn diff(&self, fields: &RequestFields) -> DiffResponse {
        let request = match DiffRequest::from_fields(fields) {
            Ok(request) => request,
            Err(error) => {
                info!(fields = fields.len(), "Rejected malformed diff request");
                return DiffResponse::Errors(error);
            }
        };
        self.diff_request(&request)
    }

    /// Answer an already decoded diff request.
    pub fn diff_request(&self, request: &DiffRequest) -> DiffResponse {
        if let Err(error) = self.versions.check(&request.metadata) {
            warn!(
                version = request.metadata.version_str().unwrap_or(""),
                "Rejected unsupported client version"
            );
            return DiffResponse::Errors(error);
        }

        let changes = self.diff.resolve(&request.metadata, &request.files);
        info!(
            version = request.metadata.version_str().unwrap_or(""),
            submitted = request.files.len(),
            changed = changes.len(),
            "Computed change-set"
        );
        DiffResponse::Changed(changes)
    }

    /// Resolve a `<mount>/<path>` request to an open file.
    pub fn fetch(&self, requested: &str) -> Option<ResolvedFile> {
        let resolved = self.fetch.resolve(requested);
        match &resolved {
            Some(file) => debug!(
                mount = %file.mount,
                path = %file.path.display(),
                bytes = file.len,
                "Serving file"
            ),
            None => debug!(requested = %requested, "File not found"),
        }
        resolved
    }
}
