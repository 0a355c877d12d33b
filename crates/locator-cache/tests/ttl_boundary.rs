use std::sync::Arc;

use carttotal_core_types::limits::CACHE_TTL_MS;
use carttotal_core_types::{ManualClock, Selector};
use locator_cache::{CacheConfig, FileStore, InMemoryStore, KvStore, SelectorCache};

const NOW: i64 = 1_700_000_000_000;

async fn cache_written_at(written_at: i64) -> (SelectorCache, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(written_at));
    let cache = SelectorCache::with_config(store.clone(), clock.clone(), CacheConfig::default());
    cache
        .put("shop.test", vec![Selector::new("div#total", "div")])
        .await
        .unwrap();
    clock.set(NOW);
    (cache, store)
}

#[tokio::test]
async fn entry_just_past_ttl_is_absent_and_evicted() {
    let (cache, store) = cache_written_at(NOW - CACHE_TTL_MS - 1).await;
    let mut changes = store.subscribe();

    assert!(cache.get("shop.test").await.is_none());
    assert!(store.is_empty());

    let change = changes.recv().await.unwrap();
    assert_eq!(change.key, cache.cache_key("shop.test"));
    assert!(change.new_value.is_none());
}

#[tokio::test]
async fn entry_just_inside_ttl_is_present() {
    let (cache, store) = cache_written_at(NOW - CACHE_TTL_MS + 1).await;

    let selectors = cache.get("shop.test").await.expect("entry still fresh");
    assert_eq!(selectors[0].path, "div#total");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn file_backed_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("selectors.json");
    let clock = Arc::new(ManualClock::new(NOW));

    let first = SelectorCache::with_config(
        Arc::new(FileStore::open(&path).await.unwrap()),
        clock.clone(),
        CacheConfig::default(),
    );
    first
        .put("shop.test", vec![Selector::new("aside#sticky > p", "p")])
        .await
        .unwrap();

    let second = SelectorCache::with_config(
        Arc::new(FileStore::open(&path).await.unwrap()),
        clock,
        CacheConfig::default(),
    );
    let selectors = second.get("shop.test").await.unwrap();
    assert_eq!(selectors, vec![Selector::new("aside#sticky > p", "p")]);
}
