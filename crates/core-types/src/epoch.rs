use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic page generation counter.
///
/// Advanced on every navigation. Extraction passes hold an [`EpochToken`]
/// captured at start and drop their result once the token goes stale.
#[derive(Clone, Debug, Default)]
pub struct NavigationEpoch {
    counter: Arc<AtomicU64>,
}

impl NavigationEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Moves to the next generation and returns it.
    pub fn advance(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn token(&self) -> EpochToken {
        EpochToken {
            counter: Arc::clone(&self.counter),
            captured: self.current(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EpochToken {
    counter: Arc<AtomicU64>,
    captured: u64,
}

impl EpochToken {
    pub fn captured(&self) -> u64 {
        self.captured
    }

    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::SeqCst) == self.captured
    }
}
