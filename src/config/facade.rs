//! Loader entrypoint: layers sources, deserializes and validates.

use super::merge::merge_policy;
use super::sources::{config_file, environment};
use super::{config_base_dir, GameConfConfig};
use crate::error::ServerError;
use std::path::Path;
use tracing::{debug, info};

/// Builds a validated `GameConfConfig` from file and environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `config_path` with environment overrides.
    ///
    /// Missing files, malformed TOML and validation failures are all fatal.
    pub fn load_from_file(config_path: &Path) -> Result<GameConfConfig, ServerError> {
        let config = Self::load_unvalidated(config_path)?;

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ServerError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        info!(
            config_path = %config_path.display(),
            mounts = config.mounts.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load and deserialize without validation.
    pub fn load_unvalidated(config_path: &Path) -> Result<GameConfConfig, ServerError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = config_file::add_to_builder(builder, config_path)?;
        let builder = environment::add_to_builder(builder)?;

        let mut config: GameConfConfig = builder.build()?.try_deserialize()?;
        config.base_dir = Some(config_base_dir(config_path));

        debug!(
            base_dir = %config.workdir().display(),
            "Resolved configuration base directory"
        );
        Ok(config)
    }
}
