use std::collections::HashMap;
use std::sync::Arc;

use carttotal_core_types::limits::{CACHE_ENTRY_VERSION, CACHE_TTL_MS};
use carttotal_core_types::{CacheEntry, Clock, Selector, SystemClock};
use tracing::{debug, info, warn};

use crate::errors::CacheError;
use crate::store::KvStore;

pub const DEFAULT_KEY_PREFIX: &str = "price_selectors_";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl_ms: i64,
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: CACHE_TTL_MS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_domain(domain: &str) -> String {
    domain
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect()
}

/// Per-domain selector memory with lazy TTL eviction.
///
/// Failures are advisory: read errors behave like a miss and write errors are
/// returned to the caller, which is expected to log and carry on.
#[derive(Clone)]
pub struct SelectorCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl SelectorCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_config(store, Arc::new(SystemClock), CacheConfig::default())
    }

    pub fn with_config(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, config: CacheConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn cache_key(&self, domain: &str) -> String {
        format!("{}{}", self.config.key_prefix, sanitize_domain(domain))
    }

    /// Cached selectors for `domain`, or `None` when absent, expired or unreadable.
    pub async fn get(&self, domain: &str) -> Option<Vec<Selector>> {
        match self.load_entry(domain).await {
            Ok(Some(entry)) => {
                debug!(domain, selectors = entry.selectors.len(), "selector cache hit");
                Some(entry.selectors)
            }
            Ok(None) => {
                debug!(domain, "selector cache miss");
                None
            }
            Err(err) => {
                warn!(domain, %err, "selector cache read failed");
                None
            }
        }
    }

    /// Reads the live entry, evicting it first when its age exceeds the TTL.
    pub async fn load_entry(&self, domain: &str) -> Result<Option<CacheEntry>, CacheError> {
        let key = self.cache_key(domain);
        let mut found = self.store.get(std::slice::from_ref(&key)).await?;
        let Some(raw) = found.remove(&key) else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(err) => {
                self.store.remove(std::slice::from_ref(&key)).await?;
                return Err(CacheError::malformed(key, err));
            }
        };

        let now = self.clock.now_ms();
        if entry.is_expired(now, self.config.ttl_ms) {
            info!(
                domain,
                age_ms = now.saturating_sub(entry.timestamp),
                "evicting expired selector cache entry"
            );
            self.store.remove(std::slice::from_ref(&key)).await?;
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Overwrites the entry for `domain` with a fresh timestamp.
    pub async fn put(&self, domain: &str, selectors: Vec<Selector>) -> Result<(), CacheError> {
        let key = self.cache_key(domain);
        let entry = CacheEntry {
            domain: domain.to_string(),
            selectors,
            timestamp: self.clock.now_ms(),
            version: CACHE_ENTRY_VERSION,
        };
        let value = serde_json::to_value(&entry).map_err(|err| CacheError::Encode(err.to_string()))?;
        self.store.set(HashMap::from([(key, value)])).await?;
        debug!(domain, selectors = entry.selectors.len(), "selector cache updated");
        Ok(())
    }

    pub async fn remove(&self, domain: &str) -> Result<(), CacheError> {
        self.store.remove(&[self.cache_key(domain)]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use carttotal_core_types::ManualClock;
    use serde_json::json;

    fn cache_at(now: i64) -> (SelectorCache, Arc<InMemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let cache = SelectorCache::with_config(store.clone(), clock.clone(), CacheConfig::default());
        (cache, store, clock)
    }

    #[test]
    fn domains_are_sanitized_into_keys() {
        assert_eq!(sanitize_domain("www.shop-test.com:8080"), "www_shop_test_com_8080");
        let (cache, _, _) = cache_at(0);
        assert_eq!(cache.cache_key("shop.test"), "price_selectors_shop_test");
    }

    #[tokio::test]
    async fn put_overwrites_with_fresh_timestamp() {
        let (cache, _, clock) = cache_at(1_000);
        cache.put("shop.test", vec![Selector::new("div.a", "div")]).await.unwrap();
        clock.set(5_000);
        cache.put("shop.test", vec![Selector::new("div.b", "div")]).await.unwrap();

        let entry = cache.load_entry("shop.test").await.unwrap().unwrap();
        assert_eq!(entry.timestamp, 5_000);
        assert_eq!(entry.version, CACHE_ENTRY_VERSION);
        assert_eq!(entry.selectors[0].path, "div.b");
    }

    #[tokio::test]
    async fn malformed_entry_is_dropped() {
        let (cache, store, _) = cache_at(0);
        store
            .set(HashMap::from([(cache.cache_key("shop.test"), json!({"domain": 7}))]))
            .await
            .unwrap();

        assert!(cache.get("shop.test").await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn remove_clears_entry() {
        let (cache, store, _) = cache_at(0);
        cache.put("shop.test", Vec::new()).await.unwrap();
        cache.remove("shop.test").await.unwrap();
        assert!(store.is_empty());
    }
}
