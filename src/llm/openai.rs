use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prompt_analyzer::{
    Availability, AvailabilityOptions, LanguageModel, ModelError, ModelSession, SessionConfig,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ModelSettings;

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_keys: Vec<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Reads comma separated keys from the environment variable named in `settings`.
    pub fn from_settings(settings: &ModelSettings) -> Self {
        let api_keys = std::env::var(&settings.api_key_env)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            api_keys,
            model: settings.model.clone(),
            api_base: settings.api_base.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Chat-completions backend for the model capability.
///
/// Each session keeps only its system prompt; every `prompt` is one request.
pub struct OpenAiLanguageModel {
    client: Client,
    config: Arc<OpenAiConfig>,
}

impl OpenAiLanguageModel {
    pub fn new(config: OpenAiConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ModelError::session(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiLanguageModel {
    async fn availability(
        &self,
        _options: &AvailabilityOptions,
    ) -> Result<Availability, ModelError> {
        if self.config.api_keys.is_empty() {
            return Ok(Availability::Unavailable);
        }
        Ok(Availability::Available)
    }

    async fn create(&self, config: SessionConfig) -> Result<Box<dyn ModelSession>, ModelError> {
        if self.config.api_keys.is_empty() {
            return Err(ModelError::unavailable("missing OpenAI API key"));
        }
        if config.top_k.is_some() {
            debug!(target: "openai", "top_k is not supported by chat completions; ignoring");
        }
        Ok(Box::new(OpenAiSession {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            session: config,
            destroyed: false,
        }))
    }
}

struct OpenAiSession {
    client: Client,
    config: Arc<OpenAiConfig>,
    session: SessionConfig,
    destroyed: bool,
}

#[async_trait]
impl ModelSession for OpenAiSession {
    async fn prompt(&mut self, text: &str) -> Result<String, ModelError> {
        if self.destroyed {
            return Err(ModelError::Destroyed);
        }
        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );

        let mut last_error: Option<ModelError> = None;
        for (index, key) in self.config.api_keys.iter().enumerate() {
            let body = ChatCompletionRequest {
                model: self.config.model.clone(),
                temperature: self.session.temperature.map(|value| value as f32),
                response_format: ResponseFormat {
                    r#type: "json_object".to_string(),
                },
                messages: vec![
                    ChatMessage {
                        role: "system".to_string(),
                        content: self.session.system_prompt.clone(),
                    },
                    ChatMessage {
                        role: "user".to_string(),
                        content: text.to_string(),
                    },
                ],
            };

            let response = match self
                .client
                .post(&url)
                .bearer_auth(key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    last_error = Some(ModelError::prompt(format!("openai request failed: {err}")));
                    continue;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<response unavailable>".to_string());
                if status.as_u16() == 429 && index + 1 < self.config.api_keys.len() {
                    warn!(
                        target: "openai",
                        attempt = index + 1,
                        remaining = self.config.api_keys.len() - index - 1,
                        "rate limited; switching API key"
                    );
                    last_error = Some(ModelError::prompt(rate_limit_message(&text)));
                    continue;
                }
                return Err(ModelError::prompt(format!("openai returned {status}: {text}")));
            }

            let response: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|err| ModelError::prompt(format!("openai response invalid: {err}")))?;
            return response
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_text())
                .ok_or_else(|| ModelError::prompt("openai response missing content"));
        }

        Err(last_error.unwrap_or_else(|| ModelError::prompt("all API keys exhausted")))
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: ChatCompletionContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatCompletionContent {
    Text(String),
    Parts(Vec<ChatCompletionPart>),
}

impl ChatCompletionContent {
    fn as_text(&self) -> Option<String> {
        match self {
            ChatCompletionContent::Text(value) => Some(value.clone()),
            ChatCompletionContent::Parts(parts) => {
                let text = parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n");
                (!text.is_empty()).then_some(text)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

fn rate_limit_message(raw: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(raw)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .map(|message| format!("rate limit exceeded: {}", message.trim()))
        .unwrap_or_else(|| "rate limit exceeded".to_string())
}
