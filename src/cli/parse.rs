//! CLI parse: clap types for the gameconf server. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gameconf update server - serves gamedata updates to SourceMod installations
#[derive(Parser)]
#[command(name = "gameconf-server")]
#[command(about = "Serve gamedata file updates from versioned mount directories")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    #[arg(long, short = 'c', default_value = "config.toml")]
    pub config: PathBuf,

    /// Disable logging entirely
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose logging (debug level)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Subcommand to run; `serve` when none is given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the update server
    Serve {
        /// Listen host (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
        /// Hash every mounted file before accepting requests
        #[arg(long)]
        warm: bool,
    },
    /// Validate configuration and list mounts
    Check {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve {
            host: None,
            port: None,
            warm: false,
        }
    }
}
