//! Key/value store collaborator

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use carttotal_event_bus::{EventBus, InMemoryBus};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

use crate::errors::StoreError;

/// Storage area name carried on change notifications.
pub const LOCAL_AREA: &str = "local";

const CHANGE_BUS_CAPACITY: usize = 64;

/// One key changed in one storage area.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub area: String,
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Persistent key/value store with change notifications.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Values for the keys that exist; missing keys are simply absent.
    async fn get(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError>;

    async fn set(&self, items: HashMap<String, Value>) -> Result<(), StoreError>;

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// Shared notification plumbing for store backends.
pub(crate) struct ChangeFeed {
    area: String,
    bus: Arc<InMemoryBus<StoreChange>>,
}

impl ChangeFeed {
    pub(crate) fn new(area: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            bus: InMemoryBus::new(CHANGE_BUS_CAPACITY),
        }
    }

    pub(crate) async fn emit(&self, key: &str, old_value: Option<Value>, new_value: Option<Value>) {
        if old_value == new_value {
            return;
        }
        let change = StoreChange {
            area: self.area.clone(),
            key: key.to_string(),
            old_value,
            new_value,
        };
        if self.bus.publish(change).await.is_err() {
            trace!(key, "store change had no listeners");
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.bus.subscribe()
    }
}

/// Process-local store; contents vanish with the process.
pub struct InMemoryStore {
    entries: DashMap<String, Value>,
    feed: ChangeFeed,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            feed: ChangeFeed::new(LOCAL_AREA),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        Ok(keys
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|entry| (key.clone(), entry.value().clone()))
            })
            .collect())
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<(), StoreError> {
        for (key, value) in items {
            let old = self.entries.insert(key.clone(), value.clone());
            self.feed.emit(&key, old, Some(value)).await;
        }
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            if let Some((_, old)) = self.entries.remove(key) {
                self.feed.emit(key, Some(old), None).await;
            }
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_skips_missing_keys() {
        let store = InMemoryStore::new();
        store
            .set(HashMap::from([("a".to_string(), json!(1))]))
            .await
            .unwrap();
        let found = store
            .get(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found["a"], json!(1));
    }

    #[tokio::test]
    async fn changes_are_broadcast() {
        let store = InMemoryStore::new();
        let mut rx = store.subscribe();
        store
            .set(HashMap::from([("k".to_string(), json!("v"))]))
            .await
            .unwrap();
        store.remove(&["k".to_string()]).await.unwrap();

        let set = rx.recv().await.unwrap();
        assert_eq!(set.area, LOCAL_AREA);
        assert_eq!(set.old_value, None);
        assert_eq!(set.new_value, Some(json!("v")));

        let removed = rx.recv().await.unwrap();
        assert_eq!(removed.old_value, Some(json!("v")));
        assert_eq!(removed.new_value, None);
    }
}
