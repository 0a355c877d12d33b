use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::errors::StoreError;
use crate::store::{ChangeFeed, KvStore, StoreChange, LOCAL_AREA};

/// JSON-file backed store that survives restarts.
///
/// The whole map is rewritten on every mutation through a temp file and a
/// rename, so a crash never leaves a half-written document behind.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
    feed: ChangeFeed,
}

impl FileStore {
    /// Opens the store at `path`, starting empty when the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            feed: ChangeFeed::new(LOCAL_AREA),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let payload = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.path, &payload).await?;
        Ok(())
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(data).await?;
    file.flush().await?;
    fs::rename(tmp, path).await
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(key).map(|value| (key.clone(), value.clone())))
            .collect())
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let mut staged = entries.clone();
        let mut changes = Vec::with_capacity(items.len());
        for (key, value) in items {
            let old = staged.insert(key.clone(), value.clone());
            changes.push((key, old, Some(value)));
        }
        // Memory only moves once the file holds the same state.
        self.persist(&staged).await?;
        *entries = staged;
        drop(entries);

        for (key, old, new) in changes {
            self.feed.emit(&key, old, new).await;
        }
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        let mut staged = entries.clone();
        let removed: Vec<(String, Value)> = keys
            .iter()
            .filter_map(|key| staged.remove(key).map(|old| (key.clone(), old)))
            .collect();
        if removed.is_empty() {
            return Ok(());
        }
        self.persist(&staged).await?;
        *entries = staged;
        drop(entries);

        for (key, old) in removed {
            self.feed.emit(&key, Some(old), None).await;
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}
