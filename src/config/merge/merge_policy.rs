//! Merge rules: defaults, override order, conflict handling.

use crate::config::DEFAULT_PORT;
use crate::diff::DEFAULT_GAMEDATA_PREFIX;
use crate::fetch::DEFAULT_EXTENSION;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones: defaults, then the configuration
/// file, then `GAMECONF__*` environment variables.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", i64::from(DEFAULT_PORT))?
        .set_default("server.warm_cache", false)?
        .set_default("diff.prefix", DEFAULT_GAMEDATA_PREFIX)?
        .set_default("fetch.extension", DEFAULT_EXTENSION)
}
