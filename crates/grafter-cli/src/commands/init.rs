//! `grafter init`: create a default configuration file.

use std::path::PathBuf;

use tracing::instrument;

use crate::{
    cli::InitArgs,
    commands::config::write_config,
    config::{AppConfig, LOCAL_CONFIG},
    error::CliResult,
    output::OutputManager,
};

#[instrument(skip_all, fields(local = args.local, force = args.force))]
pub fn execute(args: InitArgs, output: &OutputManager) -> CliResult<()> {
    let config_path = if args.local {
        PathBuf::from(LOCAL_CONFIG)
    } else {
        AppConfig::global_path()
    };

    if config_path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {}  (use --force to overwrite)",
            config_path.display(),
        ))?;
        return Ok(());
    }

    write_config(&config_path, &AppConfig::default())?;
    output.success(&format!("Configuration created at {}", config_path.display()))?;
    Ok(())
}
