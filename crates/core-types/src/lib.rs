//! Shared primitives for the cart-total extraction pipeline.
//!
//! Every crate in the workspace exchanges these types: the scanner produces
//! [`Candidate`]s, the preprocessor turns them into [`Window`]s plus an
//! [`OriginalMap`], the validator yields an [`AnalysisResult`], and the cache
//! persists [`CacheEntry`] records keyed by domain.

pub mod clock;
pub mod epoch;
pub mod model;

pub use clock::{Clock, ManualClock, SystemClock};
pub use epoch::{EpochToken, NavigationEpoch};
pub use model::{
    AnalysisResult, CacheEntry, Candidate, OriginalMap, Selector, SimplifiedCandidate, Window,
};

/// Fixed pipeline limits. Configuration defaults mirror these values.
pub mod limits {
    /// Cached selectors older than this are treated as absent (7 days).
    pub const CACHE_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

    /// Character budget for one model window.
    pub const WINDOW_MAX_CHARS: usize = 2000;

    /// Minimum confidence that stops a multi-window analysis early.
    pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

    /// Confidence assumed when the model omits it.
    pub const DEFAULT_CONFIDENCE: f64 = 0.5;

    /// Amounts must be strictly greater than this.
    pub const PRICE_MIN_EXCLUSIVE: f64 = 0.0;

    /// Amounts must be strictly smaller than this.
    pub const PRICE_MAX_EXCLUSIVE: f64 = 100_000.0;

    /// Longer fragments are whole containers, not price labels.
    pub const MAX_CANDIDATE_TEXT_CHARS: usize = 100;

    /// Ancestor levels walked when building a selector.
    pub const MAX_SELECTOR_DEPTH: usize = 5;

    /// Schema version written into every cache entry.
    pub const CACHE_ENTRY_VERSION: u32 = 1;
}

/// Inclusive-exclusive sanity window applied to extracted amounts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceBounds {
    pub min_exclusive: f64,
    pub max_exclusive: f64,
}

impl PriceBounds {
    pub fn new(min_exclusive: f64, max_exclusive: f64) -> Self {
        Self {
            min_exclusive,
            max_exclusive,
        }
    }

    /// Returns `true` when `amount` lies strictly inside the bounds.
    pub fn contains(&self, amount: f64) -> bool {
        amount.is_finite() && amount > self.min_exclusive && amount < self.max_exclusive
    }
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self::new(limits::PRICE_MIN_EXCLUSIVE, limits::PRICE_MAX_EXCLUSIVE)
    }
}
