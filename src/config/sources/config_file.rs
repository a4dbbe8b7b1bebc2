//! Configuration file source: the TOML file named on the command line.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use config::FileFormat;
use std::path::Path;

/// Add the configuration file to the builder. The file must exist.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    config_path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !config_path.is_file() {
        return Err(ConfigError::Message(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let path = config_path.to_str().ok_or_else(|| {
        ConfigError::Message(format!(
            "Configuration path is not valid UTF-8: {}",
            config_path.display()
        ))
    })?;

    Ok(builder.add_source(File::new(path, FileFormat::Toml).required(true)))
}
