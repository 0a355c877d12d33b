use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use super::commands::Commands;
use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, LoadedConfig};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    let loaded_config = load_config(cli.config.as_ref()).await?;
    init_logging(&cli.log_level, cli.debug, loaded_config.config.logging.json)?;

    info!("Starting carttotal v{}", env!("CARGO_PKG_VERSION"));
    let LoadedConfig {
        config,
        path,
        found,
    } = loaded_config;
    if found {
        info!("Loaded configuration from: {}", path.display());
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
    }

    // `config` subcommands must still run so a broken file can be inspected or reset.
    if !matches!(cli.command, Commands::Config(_)) {
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
    }

    let cli_context = CliContext::new(config, path, cli.output);
    match dispatch(cli.command, &cli_context).await {
        Ok(()) => {
            debug!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
