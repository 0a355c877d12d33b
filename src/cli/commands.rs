use clap::Subcommand;

use super::cache::CacheArgs;
use super::config::ConfigArgs;
use super::extract::ExtractArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Find the cart total in a saved checkout page
    Extract(ExtractArgs),

    /// Inspect or clear cached selectors for a site
    Cache(CacheArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Show build and configuration information
    Info,
}
