//! Page navigation notifications
//!
//! Hosts publish a [`NavigationEvent`] whenever a page changes location.
//! The watcher advances the page's epoch so passes started on the old
//! location discard their results.

use std::sync::Arc;

use carttotal_event_bus::{EventBus, InMemoryBus};
use perceiver_price::is_checkout_page;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::PageRegistry;

const NAVIGATION_BUS_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    pub page_key: String,
    pub url: String,
    pub title: String,
    /// Whether the new location looks like a checkout flow.
    pub checkout: bool,
}

impl NavigationEvent {
    pub fn new(page_key: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        let title = title.into();
        Self {
            checkout: is_checkout_page(&url, &title),
            page_key: page_key.into(),
            url,
            title,
        }
    }
}

pub struct NavigationWatcher {
    bus: Arc<InMemoryBus<NavigationEvent>>,
}

impl Default for NavigationWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationWatcher {
    pub fn new() -> Self {
        Self {
            bus: InMemoryBus::new(NAVIGATION_BUS_CAPACITY),
        }
    }

    /// Publishes a navigation; returns how many listeners received it.
    pub async fn notify(&self, event: NavigationEvent) -> usize {
        let page = event.page_key.clone();
        match self.bus.publish(event).await {
            Ok(listeners) => listeners,
            Err(err) => {
                debug!(page, %err, "navigation dropped");
                0
            }
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<NavigationEvent> {
        self.bus.subscribe()
    }

    /// Advances the epoch of every attached page that navigates.
    ///
    /// The task ends once the watcher is dropped.
    pub fn spawn(&self, registry: Arc<PageRegistry>) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => match registry.get(&event.page_key) {
                        Some(extractor) => {
                            let epoch = extractor.epoch().advance();
                            info!(
                                page = %event.page_key,
                                url = %event.url,
                                checkout = event.checkout,
                                epoch,
                                "page navigated"
                            );
                        }
                        None => debug!(page = %event.page_key, "navigation for unattached page"),
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "navigation watcher lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use carttotal_core_types::EpochToken;
    use locator_cache::InMemoryStore;
    use prompt_analyzer::ScriptedLanguageModel;

    use crate::orchestrator::TotalExtractor;

    fn registry() -> Arc<PageRegistry> {
        Arc::new(PageRegistry::new(|| {
            TotalExtractor::new(
                Arc::new(InMemoryStore::new()),
                Arc::new(ScriptedLanguageModel::new()),
            )
        }))
    }

    async fn until_stale(token: &EpochToken) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while token.is_current() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("epoch advanced");
    }

    #[tokio::test]
    async fn navigation_invalidates_running_passes() {
        let registry = registry();
        let extractor = registry.attach("tab-1");
        let token = extractor.epoch().token();

        let watcher = NavigationWatcher::new();
        let task = watcher.spawn(Arc::clone(&registry));

        let delivered = watcher
            .notify(NavigationEvent::new("tab-1", "https://shop.test/checkout", "Checkout"))
            .await;
        assert_eq!(delivered, 1);
        until_stale(&token).await;
        assert_eq!(extractor.epoch().current(), 1);

        drop(watcher);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn unattached_pages_are_ignored() {
        let registry = registry();
        let extractor = registry.attach("tab-1");
        let token = extractor.epoch().token();

        let watcher = NavigationWatcher::new();
        let _task = watcher.spawn(Arc::clone(&registry));

        watcher
            .notify(NavigationEvent::new("tab-2", "https://other.test/", "Other"))
            .await;
        watcher
            .notify(NavigationEvent::new("tab-1", "https://shop.test/cart", "Cart"))
            .await;
        until_stale(&token).await;

        // Events are handled in order, so tab-2 was seen first and skipped.
        assert_eq!(extractor.epoch().current(), 1);
        assert!(registry.get("tab-2").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn event_flags_checkout_locations() {
        let event = NavigationEvent::new("tab", "https://shop.test/cart", "");
        assert!(event.checkout);
        assert!(!NavigationEvent::new("tab", "https://shop.test/", "Home").checkout);
    }
}
