//! Application configuration
//!
//! Every default equals the fixed pipeline constant, so running without a
//! config file behaves exactly like the built-in limits.

use std::cmp::Ordering;
use std::path::PathBuf;

use anyhow::{bail, Result};
use carttotal_core_types::{limits, PriceBounds};
use locator_cache::{CacheConfig, DEFAULT_KEY_PREFIX};
use perceiver_price::ScannerConfig;
use prompt_analyzer::{AnalyzerConfig, Preprocessor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cache: CacheSettings,
    pub scanner: ScannerSettings,
    pub preprocess: PreprocessSettings,
    pub analyzer: AnalyzerSettings,
    pub price: PriceSettings,
    pub model: ModelSettings,
    /// Probe keyword selectors when the model yields nothing.
    pub heuristic_fallback: bool,
    pub logging: LoggingSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    File,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_ms: i64,
    pub key_prefix: String,
    pub store: StoreKind,
    pub store_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScannerSettings {
    pub max_text_chars: usize,
    pub max_selector_depth: usize,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PreprocessSettings {
    pub max_chars: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalyzerSettings {
    pub confidence_threshold: f64,
    pub temperature: f64,
    pub top_k: u32,
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PriceSettings {
    pub min_exclusive: f64,
    pub max_exclusive: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    /// Canned replies supplied on the command line.
    Scripted,
    Openai,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    pub api_base: String,
    pub model: String,
    /// Environment variable holding one or more comma separated API keys.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            scanner: ScannerSettings::default(),
            preprocess: PreprocessSettings::default(),
            analyzer: AnalyzerSettings::default(),
            price: PriceSettings::default(),
            model: ModelSettings::default(),
            heuristic_fallback: false,
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: limits::CACHE_TTL_MS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            store: StoreKind::File,
            store_path: default_store_path(),
        }
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        let scanner = ScannerConfig::default();
        Self {
            max_text_chars: scanner.max_text_chars,
            max_selector_depth: scanner.max_selector_depth,
            tags: scanner.tags,
        }
    }
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            max_chars: limits::WINDOW_MAX_CHARS,
        }
    }
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        let analyzer = AnalyzerConfig::default();
        Self {
            confidence_threshold: analyzer.confidence_threshold,
            temperature: analyzer.temperature,
            top_k: analyzer.top_k,
            language: analyzer.language,
        }
    }
}

impl Default for PriceSettings {
    fn default() -> Self {
        Self {
            min_exclusive: limits::PRICE_MIN_EXCLUSIVE,
            max_exclusive: limits::PRICE_MAX_EXCLUSIVE,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Scripted,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

fn default_store_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("carttotal");
    path.push("selectors.json");
    path
}

impl Config {
    /// Rejects settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_ms <= 0 {
            bail!("cache.ttl_ms must be positive, got {}", self.cache.ttl_ms);
        }
        if self.cache.key_prefix.is_empty() {
            bail!("cache.key_prefix cannot be empty");
        }
        if self.scanner.tags.is_empty() {
            bail!("scanner.tags must list at least one tag");
        }
        if self.scanner.max_text_chars == 0 {
            bail!("scanner.max_text_chars must be positive");
        }
        if self.scanner.max_selector_depth == 0 {
            bail!("scanner.max_selector_depth must be positive");
        }
        if self.preprocess.max_chars == 0 {
            bail!("preprocess.max_chars must be positive");
        }
        if !(0.0..=1.0).contains(&self.analyzer.confidence_threshold) {
            bail!(
                "analyzer.confidence_threshold must lie in [0, 1], got {}",
                self.analyzer.confidence_threshold
            );
        }
        if self.price.min_exclusive.partial_cmp(&self.price.max_exclusive) != Some(Ordering::Less) {
            bail!(
                "price.min_exclusive ({}) must be below price.max_exclusive ({})",
                self.price.min_exclusive,
                self.price.max_exclusive
            );
        }
        if self.model.provider == ModelProvider::Openai && self.model.api_base.trim().is_empty() {
            bail!("model.api_base is required for the openai provider");
        }
        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl_ms: self.cache.ttl_ms,
            key_prefix: self.cache.key_prefix.clone(),
        }
    }

    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            tags: self.scanner.tags.clone(),
            max_text_chars: self.scanner.max_text_chars,
            max_selector_depth: self.scanner.max_selector_depth,
        }
    }

    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor::new(self.preprocess.max_chars)
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            confidence_threshold: self.analyzer.confidence_threshold,
            temperature: self.analyzer.temperature,
            top_k: self.analyzer.top_k,
            language: self.analyzer.language.clone(),
        }
    }

    pub fn price_bounds(&self) -> PriceBounds {
        PriceBounds::new(self.price.min_exclusive, self.price.max_exclusive)
    }
}
