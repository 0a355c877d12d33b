use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use locator_cache::{FileStore, InMemoryStore, KvStore};
use prompt_analyzer::{Availability, LanguageModel, ScriptedLanguageModel};
use tokio::sync::OnceCell;
use tracing::debug;

use super::output::OutputFormat;
use crate::config::{Config, ModelProvider, StoreKind};
use crate::llm::{OpenAiConfig, OpenAiLanguageModel};

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    output: OutputFormat,
    store: OnceCell<Arc<dyn KvStore>>,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, output: OutputFormat) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
            store: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    /// The configured selector store, opened on first use.
    pub async fn store(&self) -> Result<Arc<dyn KvStore>> {
        self.store
            .get_or_try_init(|| async {
                let store: Arc<dyn KvStore> = match self.config.cache.store {
                    StoreKind::Memory => Arc::new(InMemoryStore::new()),
                    StoreKind::File => {
                        let path = &self.config.cache.store_path;
                        let store = FileStore::open(path.clone())
                            .await
                            .with_context(|| format!("opening selector store {}", path.display()))?;
                        Arc::new(store)
                    }
                };
                Ok::<_, anyhow::Error>(store)
            })
            .await
            .map(Arc::clone)
    }

    /// Builds the configured model. `replies` feed the scripted provider.
    pub fn model(&self, replies: Vec<String>) -> Result<Arc<dyn LanguageModel>> {
        match self.config.model.provider {
            ModelProvider::Scripted => {
                let no_replies = replies.is_empty();
                let model = ScriptedLanguageModel::with_responses(replies);
                if no_replies {
                    debug!("no scripted replies supplied; model reports unavailable");
                    model.set_availability(Availability::Unavailable);
                }
                Ok(Arc::new(model))
            }
            ModelProvider::Openai => {
                let model = OpenAiLanguageModel::new(OpenAiConfig::from_settings(&self.config.model))
                    .context("building OpenAI model client")?;
                Ok(Arc::new(model))
            }
        }
    }
}
