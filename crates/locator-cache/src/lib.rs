//! Selector cache - remembers which locators resolved a site's total
//!
//! - [`KvStore`]: the persistent key/value collaborator with change notifications
//! - [`InMemoryStore`] and [`FileStore`]: the two shipped store backends
//! - [`SelectorCache`]: one TTL-bounded record per sanitized domain
//! - [`resolve_known`]: the cache fast path against the live document

pub mod cache;
pub mod errors;
pub mod file_store;
pub mod known;
pub mod store;

pub use cache::{sanitize_domain, CacheConfig, SelectorCache, DEFAULT_KEY_PREFIX};
pub use errors::{CacheError, StoreError};
pub use file_store::FileStore;
pub use known::resolve_known;
pub use store::{InMemoryStore, KvStore, StoreChange, LOCAL_AREA};
