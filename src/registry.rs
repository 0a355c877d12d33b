use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::orchestrator::TotalExtractor;

type ExtractorFactory = dyn Fn() -> TotalExtractor + Send + Sync;

/// Owns one [`TotalExtractor`] per live page.
///
/// Attaching twice to the same page returns the same extractor. Detaching
/// invalidates any pass still running for that page.
pub struct PageRegistry {
    pages: DashMap<String, Arc<TotalExtractor>>,
    factory: Box<ExtractorFactory>,
}

impl PageRegistry {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> TotalExtractor + Send + Sync + 'static,
    {
        Self {
            pages: DashMap::new(),
            factory: Box::new(factory),
        }
    }

    pub fn attach(&self, page_key: &str) -> Arc<TotalExtractor> {
        self.pages
            .entry(page_key.to_string())
            .or_insert_with(|| {
                debug!(page = page_key, "attaching extractor");
                Arc::new((self.factory)())
            })
            .clone()
    }

    pub fn get(&self, page_key: &str) -> Option<Arc<TotalExtractor>> {
        self.pages.get(page_key).map(|entry| entry.value().clone())
    }

    pub fn detach(&self, page_key: &str) -> Option<Arc<TotalExtractor>> {
        let (_, extractor) = self.pages.remove(page_key)?;
        extractor.epoch().advance();
        debug!(page = page_key, "detached extractor");
        Some(extractor)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
