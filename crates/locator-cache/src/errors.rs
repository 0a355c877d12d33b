use thiserror::Error;

/// Errors raised by key/value store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors raised by the selector cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed cache entry for '{key}': {reason}")]
    MalformedEntry { key: String, reason: String },

    #[error("failed to encode cache entry: {0}")]
    Encode(String),
}

impl CacheError {
    pub fn malformed(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedEntry {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
