//! Error types for the gameconf update server.

use std::path::PathBuf;
use thiserror::Error;

/// Startup and configuration errors.
///
/// Every variant is fatal: the server refuses to start rather than run with a
/// partially configured mount set.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Mount '{name}' root is not an existing directory: {path:?}")]
    MountRootMissing { name: String, path: PathBuf },

    #[error("Duplicate mount name: {0}")]
    DuplicateMount(String),

    #[error("Invalid mount name: {0:?}")]
    InvalidMountName(String),

    #[error("Server I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Server runtime error: {0}")]
    Runtime(String),
}

impl From<config::ConfigError> for ServerError {
    fn from(err: config::ConfigError) -> Self {
        ServerError::ConfigError(err.to_string())
    }
}

/// Per-request errors surfaced to the client as an `Errors` document.
///
/// The display strings are part of the wire protocol; clients show them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Failed to parse request.")]
    Malformed,

    #[error("Unsupported SourceMod version. Please upgrade.")]
    UnsupportedVersion,
}

/// A dotted version string that could not be parsed into integer components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version string {0:?}")]
pub struct VersionParseError(pub String);
