//! CLI route: single route table and run context. Dispatches to the service and presentation.

use crate::api::GameConfService;
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_check_json, format_check_text, MountSummary};
use crate::config::{ConfigLoader, GameConfConfig};
use crate::error::ServerError;
use crate::mount::walker;
use crate::server;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runtime context for CLI execution: loaded configuration and its origin.
pub struct RunContext {
    config: GameConfConfig,
    config_path: PathBuf,
}

impl RunContext {
    /// Load and validate configuration. Uses ConfigLoader only.
    pub fn new(config_path: PathBuf) -> Result<Self, ServerError> {
        let config = ConfigLoader::load_from_file(&config_path)?;
        Ok(Self {
            config,
            config_path,
        })
    }

    /// Context around an already loaded configuration.
    pub fn from_config(config: GameConfConfig, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &GameConfConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Run a command, returning text for stdout.
    pub fn execute(&self, command: &Commands) -> Result<String, ServerError> {
        match command {
            Commands::Serve { host, port, warm } => {
                self.serve(host.clone(), *port, *warm)?;
                Ok(String::new())
            }
            Commands::Check { format } => self.check(format),
        }
    }

    fn serve(&self, host: Option<String>, port: Option<u16>, warm: bool) -> Result<(), ServerError> {
        let mut config = self.config.clone();
        if let Some(host) = host {
            config.server.host = host;
        }
        if let Some(port) = port {
            config.server.port = port;
        }

        let service = GameConfService::from_config(&config)?;
        if warm || config.server.warm_cache {
            service.warm();
        }

        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ServerError::Runtime(format!("Failed to start runtime: {}", e)))?;
        runtime.block_on(server::serve(&config, service))
    }

    fn check(&self, format: &str) -> Result<String, ServerError> {
        let service = GameConfService::from_config(&self.config)?;
        let mounts: Vec<MountSummary> = service
            .registry()
            .iter()
            .map(|mount| MountSummary {
                name: mount.name().to_string(),
                root: mount.root().display().to_string(),
                eligibility: mount.eligibility().to_string(),
                files: walker::walk_files(mount.root()).len(),
            })
            .collect();
        info!(
            config_path = %self.config_path.display(),
            mounts = mounts.len(),
            "Configuration check passed"
        );

        match format {
            "json" => format_check_json(&mounts)
                .map_err(|e| ServerError::Runtime(format!("Failed to render JSON: {}", e))),
            "text" => Ok(format_check_text(&mounts)),
            other => Err(ServerError::ConfigError(format!(
                "Invalid output format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}
