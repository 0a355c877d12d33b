//! Cart total orchestration
//!
//! [`TotalExtractor`] evaluates a fixed strategy chain per pass:
//! 1. [`Strategy::CacheHit`] - cached selectors for the domain still resolve
//! 2. [`Strategy::ModelWindow`] - scan, preprocess and ask the model
//! 3. [`Strategy::HeuristicScan`] - keyword selectors, only when enabled
//!
//! Every failure degrades to "no amount"; nothing here returns an error.

use std::fmt;
use std::sync::Arc;

use carttotal_core_types::{Clock, EpochToken, NavigationEpoch, PriceBounds, Selector, SystemClock};
use locator_cache::{resolve_known, KvStore, SelectorCache};
use perceiver_price::{extract_price_manually, CandidateScanner, DocumentQuery};
use prompt_analyzer::{LanguageModel, ModelAnalyzer, Preprocessor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;

/// Which strategy produced an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "window", rename_all = "snake_case")]
pub enum Strategy {
    CacheHit,
    HeuristicScan,
    /// 1-based window whose result passed the gate.
    ModelWindow(usize),
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheHit => f.write_str("cache hit"),
            Self::HeuristicScan => f.write_str("heuristic scan"),
            Self::ModelWindow(window) => write!(f, "model window {window}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub amount: f64,
    pub strategy: Strategy,
    /// Selectors that located the amount; empty for the heuristic scan.
    pub selectors: Vec<Selector>,
}

/// One page's extraction pipeline.
pub struct TotalExtractor {
    scanner: CandidateScanner,
    cache: SelectorCache,
    preprocessor: Preprocessor,
    analyzer: ModelAnalyzer,
    bounds: PriceBounds,
    heuristic_fallback: bool,
    epoch: NavigationEpoch,
}

impl TotalExtractor {
    /// Extractor with the built-in limits.
    pub fn new(store: Arc<dyn KvStore>, model: Arc<dyn LanguageModel>) -> Self {
        Self::from_config(&Config::default(), store, model, Arc::new(SystemClock))
    }

    pub fn from_config(
        config: &Config,
        store: Arc<dyn KvStore>,
        model: Arc<dyn LanguageModel>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            scanner: CandidateScanner::new(config.scanner_config()),
            cache: SelectorCache::with_config(store, clock, config.cache_config()),
            preprocessor: config.preprocessor(),
            analyzer: ModelAnalyzer::with_config(model, config.analyzer_config()),
            bounds: config.price_bounds(),
            heuristic_fallback: config.heuristic_fallback,
            epoch: NavigationEpoch::new(),
        }
    }

    pub fn with_heuristic_fallback(mut self, enabled: bool) -> Self {
        self.heuristic_fallback = enabled;
        self
    }

    /// Shares an epoch owned by the host instead of a private one.
    pub fn with_epoch(mut self, epoch: NavigationEpoch) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn epoch(&self) -> &NavigationEpoch {
        &self.epoch
    }

    pub fn cache(&self) -> &SelectorCache {
        &self.cache
    }

    pub fn scanner(&self) -> &CandidateScanner {
        &self.scanner
    }

    /// The final total for the page, if one can be determined.
    pub async fn get_cart_total<D>(&self, doc: &D, domain: &str) -> Option<f64>
    where
        D: DocumentQuery + ?Sized,
    {
        self.extract(doc, domain).await.map(|extraction| extraction.amount)
    }

    /// Like [`get_cart_total`](Self::get_cart_total), also reporting how the amount was found.
    pub async fn extract<D>(&self, doc: &D, domain: &str) -> Option<Extraction>
    where
        D: DocumentQuery + ?Sized,
    {
        let token = self.epoch.token();

        if let Some(extraction) = self.try_cache(doc, domain).await {
            return self.settle(extraction, &token);
        }

        if let Some(extraction) = self.try_model(doc, domain, &token).await {
            if !token.is_current() {
                info!(domain, "page changed during analysis, dropping result");
                return None;
            }
            if let Err(err) = self.cache.put(domain, extraction.selectors.clone()).await {
                warn!(domain, %err, "failed to cache selectors");
            }
            return Some(extraction);
        }

        if self.heuristic_fallback {
            if let Some(amount) = extract_price_manually(doc, &self.bounds) {
                let extraction = Extraction {
                    amount,
                    strategy: Strategy::HeuristicScan,
                    selectors: Vec::new(),
                };
                return self.settle(extraction, &token);
            }
        }

        debug!(domain, "no cart total found");
        None
    }

    async fn try_cache<D>(&self, doc: &D, domain: &str) -> Option<Extraction>
    where
        D: DocumentQuery + ?Sized,
    {
        let selectors = self.cache.get(domain).await?;
        let amount = resolve_known(doc, &selectors, &self.bounds)?;
        info!(domain, amount, "cart total from cached selectors");
        Some(Extraction {
            amount,
            strategy: Strategy::CacheHit,
            selectors,
        })
    }

    async fn try_model<D>(&self, doc: &D, domain: &str, token: &EpochToken) -> Option<Extraction>
    where
        D: DocumentQuery + ?Sized,
    {
        let candidates = self.scanner.scan(doc);
        if candidates.is_empty() {
            debug!(domain, "no price candidates on page");
            return None;
        }

        let prepared = self.preprocessor.preprocess(&candidates);
        if prepared.is_empty() {
            return None;
        }

        let verdict = self
            .analyzer
            .analyze_traced(&prepared.plan, &prepared.original_map, Some(token))
            .await?;
        let Some(amount) = verdict.result.amount else {
            info!(domain, window = verdict.window, "model found no amount");
            return None;
        };
        info!(
            domain,
            amount,
            window = verdict.window,
            confidence = verdict.result.confidence,
            "cart total from model"
        );
        Some(Extraction {
            amount,
            strategy: Strategy::ModelWindow(verdict.window),
            selectors: verdict.result.selectors,
        })
    }

    fn settle(&self, extraction: Extraction, token: &EpochToken) -> Option<Extraction> {
        if token.is_current() {
            Some(extraction)
        } else {
            info!(strategy = %extraction.strategy, "page changed, dropping result");
            None
        }
    }
}
