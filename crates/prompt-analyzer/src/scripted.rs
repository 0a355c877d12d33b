use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ModelError;
use crate::model::{Availability, AvailabilityOptions, LanguageModel, ModelSession, SessionConfig};

/// Deterministic stand-in for a generative model.
///
/// Replies are consumed in order across all sessions. Counters record how
/// many sessions were opened and destroyed and how many prompts were sent.
pub struct ScriptedLanguageModel {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    availability: Mutex<Option<Result<Availability, ModelError>>>,
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<String>>,
    configs: Mutex<Vec<SessionConfig>>,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl ScriptedLanguageModel {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new();
        for response in responses {
            model.push_response(response);
        }
        model
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.shared.replies.lock().push_back(Ok(response.into()));
    }

    pub fn push_failure(&self, error: ModelError) {
        self.shared.replies.lock().push_back(Err(error));
    }

    pub fn set_availability(&self, availability: Availability) {
        *self.shared.availability.lock() = Some(Ok(availability));
    }

    /// Makes the availability check itself fail.
    pub fn fail_availability(&self, error: ModelError) {
        *self.shared.availability.lock() = Some(Err(error));
    }

    pub fn prompt_count(&self) -> usize {
        self.shared.prompts.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.shared.prompts.lock().clone()
    }

    pub fn session_configs(&self) -> Vec<SessionConfig> {
        self.shared.configs.lock().clone()
    }

    pub fn sessions_created(&self) -> usize {
        self.shared.created.load(Ordering::SeqCst)
    }

    pub fn sessions_destroyed(&self) -> usize {
        self.shared.destroyed.load(Ordering::SeqCst)
    }

    pub fn remaining_responses(&self) -> usize {
        self.shared.replies.lock().len()
    }
}

impl Default for ScriptedLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn availability(
        &self,
        _options: &AvailabilityOptions,
    ) -> Result<Availability, ModelError> {
        self.shared
            .availability
            .lock()
            .clone()
            .unwrap_or(Ok(Availability::Available))
    }

    async fn create(&self, config: SessionConfig) -> Result<Box<dyn ModelSession>, ModelError> {
        self.shared.configs.lock().push(config);
        self.shared.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            shared: Arc::clone(&self.shared),
            destroyed: false,
        }))
    }
}

struct ScriptedSession {
    shared: Arc<Shared>,
    destroyed: bool,
}

#[async_trait]
impl ModelSession for ScriptedSession {
    async fn prompt(&mut self, text: &str) -> Result<String, ModelError> {
        if self.destroyed {
            return Err(ModelError::Destroyed);
        }
        self.shared.prompts.lock().push(text.to_string());
        self.shared
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::prompt("no scripted response left")))
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.shared.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            system_prompt: "sys".into(),
            temperature: None,
            top_k: None,
            language: None,
        }
    }

    #[test]
    fn destroy_is_idempotent() {
        let model = ScriptedLanguageModel::with_responses(["{}"]);
        let mut session = tokio_test::block_on(model.create(config())).unwrap();
        session.destroy();
        session.destroy();
        assert_eq!(model.sessions_destroyed(), 1);
        assert_eq!(
            tokio_test::block_on(session.prompt("hi")),
            Err(ModelError::Destroyed)
        );
    }

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let model = ScriptedLanguageModel::with_responses(["one", "two"]);
        let mut session = model.create(config()).await.unwrap();
        assert_eq!(session.prompt("a").await.unwrap(), "one");
        assert_eq!(session.prompt("b").await.unwrap(), "two");
        assert!(session.prompt("c").await.is_err());
        assert_eq!(model.prompt_count(), 3);
    }

    #[tokio::test]
    async fn availability_defaults_to_available() {
        let model = ScriptedLanguageModel::new();
        let options = AvailabilityOptions::default();
        assert_eq!(
            model.availability(&options).await,
            Ok(Availability::Available)
        );
        model.set_availability(Availability::Downloadable);
        assert_eq!(
            model.availability(&options).await,
            Ok(Availability::Downloadable)
        );
    }
}
