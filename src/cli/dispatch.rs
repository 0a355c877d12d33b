use anyhow::Result;

use super::cache::cmd_cache;
use super::config::cmd_config;
use super::extract::cmd_extract;
use super::info::cmd_info;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(command: Commands, ctx: &CliContext) -> Result<()> {
    match command {
        Commands::Extract(args) => cmd_extract(args, ctx).await,
        Commands::Cache(args) => cmd_cache(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Info => cmd_info(ctx).await,
    }
}
