use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-resolvable locator for a document position.
///
/// `path` is a CSS selector built from at most five ancestors. The element's
/// own `id`, class attribute and tag travel alongside so a resolver can try
/// the cheaper id lookup before evaluating the path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub tag: String,
}

impl Selector {
    pub fn new(path: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: None,
            class_name: None,
            tag: tag.into(),
        }
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id.filter(|value| !value.is_empty());
        self
    }

    pub fn with_class_name(mut self, class_name: Option<String>) -> Self {
        self.class_name = class_name.filter(|value| !value.trim().is_empty());
        self
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Short, price-like text fragment paired with its locator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub locator: Selector,
    pub text: String,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_names: Option<String>,
}

impl Candidate {
    /// Builds a candidate whose tag, id and classes are taken from the locator.
    pub fn from_locator(locator: Selector, text: impl Into<String>) -> Self {
        Self {
            tag: locator.tag.clone(),
            id: locator.id.clone(),
            class_names: locator.class_name.clone(),
            text: text.into(),
            locator,
        }
    }
}

/// Minimal unit sent to the model; `index` points into the [`OriginalMap`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedCandidate {
    pub index: usize,
    pub text: String,
}

impl SimplifiedCandidate {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Contiguous run of simplified candidates analysed in one model call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Window {
    pub items: Vec<SimplifiedCandidate>,
}

impl Window {
    pub fn new(items: Vec<SimplifiedCandidate>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimplifiedCandidate> {
        self.items.iter()
    }
}

/// Index back to full candidate data; lives for one extraction pass only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OriginalMap {
    entries: BTreeMap<usize, Candidate>,
}

impl OriginalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, candidate: Candidate) {
        self.entries.insert(index, candidate);
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.entries.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Candidate)> {
        self.entries.iter().map(|(index, candidate)| (*index, candidate))
    }
}

/// Validated outcome of one model response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub amount: Option<f64>,
    pub confidence: f64,
    pub explanation: String,
    pub selectors: Vec<Selector>,
}

impl AnalysisResult {
    pub fn meets(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}

/// Per-domain cache record as persisted in the key/value store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub domain: String,
    pub selectors: Vec<Selector>,
    /// Milliseconds since the Unix epoch at write time.
    pub timestamp: i64,
    pub version: u32,
}

impl CacheEntry {
    /// An entry is expired once its age strictly exceeds `ttl_ms`.
    pub fn is_expired(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) > ttl_ms
    }
}
