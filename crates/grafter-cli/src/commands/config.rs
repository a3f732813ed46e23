//! `grafter config`: read and write configuration values.

use std::path::Path;

use tracing::{debug, instrument};

use crate::{
    cli::ConfigCommands,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all)]
pub fn execute(cmd: ConfigCommands, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_value(config, &key)?;
            output.print(&value)?;
        }

        ConfigCommands::Set { key, value } => {
            let path = AppConfig::config_path();
            let stored = stored_config(&path)?;
            let updated = stored.with_value(&key, &value)?;
            write_config(&path, &updated)?;
            output.success(&format!("{key} set in {}", path.display()))?;
        }

        ConfigCommands::List => {
            if output.is_json() {
                output.json(config)?;
            } else {
                output.print(render(config)?.trim_end())?;
            }
        }

        ConfigCommands::Path => {
            output.print(&AppConfig::config_path().display().to_string())?;
        }
    }

    Ok(())
}

fn get_value(config: &AppConfig, key: &str) -> CliResult<String> {
    config.get(key).ok_or_else(|| CliError::ConfigError {
        message: format!("Unknown config key: '{key}'"),
        source: None,
    })
}

/// The configuration stored in `path` alone, without environment overrides,
/// so `config set` never persists a value that came from a variable.
fn stored_config(path: &Path) -> CliResult<AppConfig> {
    if !path.is_file() {
        return Ok(AppConfig::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| CliError::IoError {
        message: format!("Failed to read config from '{}'", path.display()),
        source: e,
    })?;
    toml::from_str(&raw).map_err(|e| CliError::ConfigError {
        message: format!("Failed to parse '{}': {e}", path.display()),
        source: Some(Box::new(e)),
    })
}

pub(crate) fn render(config: &AppConfig) -> CliResult<String> {
    toml::to_string_pretty(config).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise config: {e}"),
        source: Some(Box::new(e)),
    })
}

pub(crate) fn write_config(path: &Path, config: &AppConfig) -> CliResult<()> {
    let text = render(config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CliError::IoError {
            message: format!("Failed to create config directory '{}'", parent.display()),
            source: e,
        })?;
    }
    std::fs::write(path, text).map_err(|e| CliError::IoError {
        message: format!("Failed to write config to '{}'", path.display()),
        source: e,
    })?;
    debug!(path = %path.display(), "configuration written");
    Ok(())
}
