use std::sync::Arc;

use anyhow::Result;
use carttotal_core_types::{CacheEntry, SystemClock};
use chrono::{TimeZone, Utc};
use clap::{Args, Subcommand};
use locator_cache::SelectorCache;
use serde::Serialize;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheAction {
    /// Show the cached selectors for a site
    Show {
        /// Site host, e.g. shop.example.com
        #[arg(long)]
        domain: String,
    },

    /// Forget the cached selectors for a site
    Clear {
        /// Site host, e.g. shop.example.com
        #[arg(long)]
        domain: String,
    },
}

#[derive(Debug, Serialize)]
struct CacheReport {
    key: String,
    entry: Option<CacheEntry>,
}

pub async fn cmd_cache(args: CacheArgs, ctx: &CliContext) -> Result<()> {
    let cache = SelectorCache::with_config(
        ctx.store().await?,
        Arc::new(SystemClock),
        ctx.config().cache_config(),
    );

    match args.action {
        CacheAction::Show { domain } => {
            let report = CacheReport {
                key: cache.cache_key(&domain),
                entry: cache.load_entry(&domain).await?,
            };
            ctx.output().emit(&report, |report| match &report.entry {
                Some(entry) => {
                    let written = Utc
                        .timestamp_millis_opt(entry.timestamp)
                        .single()
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_else(|| entry.timestamp.to_string());
                    println!("Cached selectors for {} ({})", entry.domain, report.key);
                    println!("- Written: {written}");
                    println!("- Version: {}", entry.version);
                    for selector in &entry.selectors {
                        println!("- {selector}");
                    }
                }
                None => println!("No cached selectors under {}", report.key),
            })?;
        }
        CacheAction::Clear { domain } => {
            cache.remove(&domain).await?;
            println!("Cleared {}", cache.cache_key(&domain));
        }
    }
    Ok(())
}
