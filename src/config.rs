//! Configuration System
//!
//! Startup configuration for the update server: listener settings, the ordered
//! mount list, protocol knobs and logging. Loaded once by `ConfigLoader` and
//! passed into the service; nothing reads configuration from global state.

use crate::diff::DEFAULT_GAMEDATA_PREFIX;
use crate::fetch::DEFAULT_EXTENSION;
use crate::logging::LoggingConfig;
use crate::mount::{validate_mount_name, Eligibility, Version};
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Default listening port (0x4D53, "MS").
pub const DEFAULT_PORT: u16 = 0x4D53;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub attribution: AttributionConfig,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    /// Mounts in lookup order
    #[serde(default)]
    pub mounts: Vec<MountConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Directory relative paths are resolved against; set by the loader to the
    /// configuration file's directory.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base directory for relative mount paths
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Hash every mounted file before accepting requests
    #[serde(default)]
    pub warm_cache: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workdir: None,
            warm_cache: false,
        }
    }
}

/// Operator attribution sent with every response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default)]
    pub source: String,
}

/// Diff protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Oldest supported client version (inclusive)
    #[serde(default)]
    pub min_version: Option<Version>,

    /// First unsupported client version (exclusive)
    #[serde(default)]
    pub max_version: Option<Version>,
}

fn default_prefix() -> String {
    DEFAULT_GAMEDATA_PREFIX.to_string()
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            min_version: None,
            max_version: None,
        }
    }
}

/// File retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
        }
    }
}

/// One mounted content directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    pub name: String,
    pub path: PathBuf,
    /// Required client version prefix; absent means always eligible
    #[serde(default)]
    pub version: Option<Version>,
}

impl MountConfig {
    pub fn eligibility(&self) -> Eligibility {
        match &self.version {
            Some(version) => Eligibility::VersionPrefix(version.clone()),
            None => Eligibility::Always,
        }
    }
}

impl Default for GameConfConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            attribution: AttributionConfig::default(),
            diff: DiffConfig::default(),
            fetch: FetchConfig::default(),
            mounts: Vec::new(),
            logging: LoggingConfig::default(),
            base_dir: None,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Mount(String, String),
    Attribution(String),
    Diff(String),
    Fetch(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Mount(name, msg) => write!(f, "Mount '{}': {}", name, msg),
            ValidationError::Attribution(msg) => write!(f, "Attribution: {}", msg),
            ValidationError::Diff(msg) => write!(f, "Diff: {}", msg),
            ValidationError::Fetch(msg) => write!(f, "Fetch: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl GameConfConfig {
    /// Directory relative mount paths resolve against.
    pub fn workdir(&self) -> PathBuf {
        let base = self
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        match &self.server.workdir {
            Some(workdir) if workdir.is_absolute() => workdir.clone(),
            Some(workdir) => base.join(workdir),
            None => base,
        }
    }

    /// Physical directory for a mount.
    pub fn mount_root(&self, mount: &MountConfig) -> PathBuf {
        if mount.path.is_absolute() {
            mount.path.clone()
        } else {
            self.workdir().join(&mount.path)
        }
    }

    /// `host:port` listen address.
    pub fn bind_address(&self) -> String {
        let host = if self.server.host.is_empty() {
            default_host()
        } else {
            self.server.host.clone()
        };
        format!("{}:{}", host, self.server.port)
    }

    /// Validate the entire configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let source = self.attribution.source.trim();
        if source.is_empty() {
            errors.push(ValidationError::Attribution(
                "attribution.source is required".to_string(),
            ));
        } else if HeaderValue::from_str(source).is_err() {
            errors.push(ValidationError::Attribution(format!(
                "'{}' is not a valid header value",
                source
            )));
        }

        if self.diff.prefix.is_empty() {
            errors.push(ValidationError::Diff("prefix cannot be empty".to_string()));
        }
        if let (Some(min), Some(max)) = (&self.diff.min_version, &self.diff.max_version) {
            if min >= max {
                errors.push(ValidationError::Diff(format!(
                    "min_version {} must be below max_version {}",
                    min, max
                )));
            }
        }

        if self.fetch.extension.trim_start_matches('.').is_empty() {
            errors.push(ValidationError::Fetch("extension cannot be empty".to_string()));
        }

        if self.mounts.is_empty() {
            errors.push(ValidationError::Mount(
                "<none>".to_string(),
                "at least one mount is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for mount in &self.mounts {
            if let Err(e) = validate_mount_name(&mount.name) {
                errors.push(ValidationError::Mount(mount.name.clone(), e.to_string()));
            }
            if !seen.insert(mount.name.as_str()) {
                errors.push(ValidationError::Mount(
                    mount.name.clone(),
                    "duplicate mount name".to_string(),
                ));
            }
            let root = self.mount_root(mount);
            if !root.is_dir() {
                errors.push(ValidationError::Mount(
                    mount.name.clone(),
                    format!("directory does not exist: {}", root.display()),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Directory containing `config_path`, used as the default base directory.
pub fn config_base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
