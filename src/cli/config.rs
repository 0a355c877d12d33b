use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio::fs;
use tracing::info;

use crate::cli::context::CliContext;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Overwrite the configuration file with defaults
    Reset,

    /// Check value ranges of the effective configuration
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path();
    match args.action {
        ConfigAction::Show => ctx.output().emit(ctx.config(), |config| {
            println!("Effective configuration ({}):", path.display());
            match serde_yaml::to_string(config) {
                Ok(yaml) => print!("{yaml}"),
                Err(err) => println!("<unprintable: {err}>"),
            }
        })?,
        ConfigAction::Reset => {
            write_defaults(path).await?;
            info!(path = %path.display(), "configuration reset");
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Validate => {
            // Parse errors already surfaced while loading; only ranges remain.
            ctx.config()
                .validate()
                .with_context(|| format!("validating {}", path.display()))?;
            if fs::try_exists(path).await? {
                println!("Configuration file {} is valid", path.display());
            } else {
                println!("No configuration file at {}; defaults are valid", path.display());
            }
        }
    }
    Ok(())
}

async fn write_defaults(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let yaml = serde_yaml::to_string(&Config::default())?;
    fs::write(path, yaml)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
