//! Environment source: `GAMECONF__SECTION__KEY=value` overrides.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Prefix for configuration overrides, e.g. `GAMECONF__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "GAMECONF";

/// Separator between the prefix, sections and keys.
pub const ENV_SEPARATOR: &str = "__";

/// Add environment overrides to builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR),
    ))
}
