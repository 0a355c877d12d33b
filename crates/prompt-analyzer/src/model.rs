use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::errors::ModelError;

/// Capability status reported by [`LanguageModel::availability`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Availability {
    Available,
    Downloadable,
    Downloading,
    Unavailable,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl AvailabilityOptions {
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
        }
    }
}

/// Per-session settings handed to [`LanguageModel::create`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub system_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Generative text capability: a status check plus a session factory.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn availability(&self, options: &AvailabilityOptions)
        -> Result<Availability, ModelError>;

    async fn create(&self, config: SessionConfig) -> Result<Box<dyn ModelSession>, ModelError>;
}

/// One conversation with the model. Single-shot prompts, no streaming.
#[async_trait]
pub trait ModelSession: Send {
    async fn prompt(&mut self, text: &str) -> Result<String, ModelError>;

    /// Releases the session. Calling it more than once is a no-op.
    fn destroy(&mut self);
}

/// Owns a session for exactly one analysis and destroys it on drop.
pub struct ScopedSession {
    inner: Box<dyn ModelSession>,
}

impl ScopedSession {
    pub fn new(inner: Box<dyn ModelSession>) -> Self {
        Self { inner }
    }

    pub async fn prompt(&mut self, text: &str) -> Result<String, ModelError> {
        self.inner.prompt(text).await
    }
}

impl Drop for ScopedSession {
    fn drop(&mut self) {
        trace!("destroying model session");
        self.inner.destroy();
    }
}
