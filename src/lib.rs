//! CartTotal library
//!
//! Finds the final amount a shopper is about to pay on an arbitrary
//! checkout page: cached selectors first, then a windowed model analysis
//! over scanned price candidates.

pub mod cli;
pub mod config;
pub mod llm;
pub mod navigation;
pub mod orchestrator;
pub mod registry;

pub use config::Config;
pub use navigation::{NavigationEvent, NavigationWatcher};
pub use orchestrator::{Extraction, Strategy, TotalExtractor};
pub use registry::PageRegistry;
