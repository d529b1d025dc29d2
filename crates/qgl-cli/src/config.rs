use crate::error::{CliError, Result};
use qgl_core::EngineConfig;
use std::path::Path;

/// Engine configuration from a TOML file, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text).map_err(|message| CliError::Config {
        path: path.to_path_buf(),
        message,
    })?;
    tracing::debug!(path = %path.display(), ?config, "loaded configuration");
    Ok(config)
}

fn parse_config(text: &str) -> std::result::Result<EngineConfig, String> {
    toml::from_str(text).map_err(|e| e.to_string())
}
