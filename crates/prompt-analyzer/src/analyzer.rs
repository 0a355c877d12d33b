use std::sync::Arc;

use carttotal_core_types::limits::CONFIDENCE_THRESHOLD;
use carttotal_core_types::{AnalysisResult, EpochToken, OriginalMap, Window};
use tracing::{debug, info, warn};

use crate::errors::ModelError;
use crate::model::{Availability, AvailabilityOptions, LanguageModel, ScopedSession, SessionConfig};
use crate::preprocess::AnalysisPlan;
use crate::prompt::{analysis_prompt, SYSTEM_PROMPT};
use crate::validator::ResultValidator;

/// A validated result and the 1-based window that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowVerdict {
    pub window: usize,
    pub result: AnalysisResult,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerConfig {
    pub confidence_threshold: f64,
    pub temperature: f64,
    pub top_k: u32,
    pub language: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            temperature: 0.1,
            top_k: 1,
            language: "en".to_string(),
        }
    }
}

/// Runs the model over one or more windows with a confidence gate.
#[derive(Clone)]
pub struct ModelAnalyzer {
    model: Arc<dyn LanguageModel>,
    validator: ResultValidator,
    config: AnalyzerConfig,
}

impl ModelAnalyzer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self::with_config(model, AnalyzerConfig::default())
    }

    pub fn with_config(model: Arc<dyn LanguageModel>, config: AnalyzerConfig) -> Self {
        Self {
            model,
            validator: ResultValidator::new(),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// `true` only when the model reports itself ready to use right now.
    pub async fn is_available(&self) -> bool {
        let options = AvailabilityOptions::language(self.config.language.clone());
        match self.model.availability(&options).await {
            Ok(Availability::Available) => true,
            Ok(status) => {
                info!(?status, "language model not ready");
                false
            }
            Err(err) => {
                warn!(%err, "language model availability check failed");
                false
            }
        }
    }

    pub async fn analyze(
        &self,
        plan: &AnalysisPlan,
        original_map: &OriginalMap,
    ) -> Option<AnalysisResult> {
        self.analyze_traced(plan, original_map, None)
            .await
            .map(|verdict| verdict.result)
    }

    /// Like [`analyze`](Self::analyze), but gives up before starting another
    /// window once `token` has gone stale.
    pub async fn analyze_with_token(
        &self,
        plan: &AnalysisPlan,
        original_map: &OriginalMap,
        token: &EpochToken,
    ) -> Option<AnalysisResult> {
        self.analyze_traced(plan, original_map, Some(token))
            .await
            .map(|verdict| verdict.result)
    }

    /// Full analysis that also reports which window answered.
    pub async fn analyze_traced(
        &self,
        plan: &AnalysisPlan,
        original_map: &OriginalMap,
        token: Option<&EpochToken>,
    ) -> Option<WindowVerdict> {
        if plan.windows().iter().all(Window::is_empty) {
            return None;
        }
        if !self.is_available().await {
            return None;
        }

        let outcome = match plan {
            AnalysisPlan::Single(window) => self
                .analyze_window(window, original_map)
                .await
                .map(|result| result.map(|result| WindowVerdict { window: 1, result })),
            AnalysisPlan::Windows(windows) => {
                self.analyze_windows(windows, original_map, token).await
            }
        };
        match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(%err, "model analysis failed");
                None
            }
        }
    }

    async fn analyze_windows(
        &self,
        windows: &[Window],
        original_map: &OriginalMap,
        token: Option<&EpochToken>,
    ) -> Result<Option<WindowVerdict>, ModelError> {
        let total = windows.len();
        for (position, window) in windows.iter().enumerate() {
            if token.is_some_and(|token| !token.is_current()) {
                info!(window = position + 1, total, "page changed, abandoning analysis");
                return Ok(None);
            }
            debug!(window = position + 1, total, items = window.len(), "analyzing window");

            let result = self.analyze_window(window, original_map).await?;
            if let Some(result) = result {
                if result.meets(self.config.confidence_threshold) {
                    info!(
                        window = position + 1,
                        total,
                        confidence = result.confidence,
                        "confident result found"
                    );
                    return Ok(Some(WindowVerdict {
                        window: position + 1,
                        result,
                    }));
                }
                debug!(
                    window = position + 1,
                    confidence = result.confidence,
                    threshold = self.config.confidence_threshold,
                    "result below confidence threshold"
                );
            }
        }
        info!(total, "no window produced a confident result");
        Ok(None)
    }

    /// One session, one prompt, one validated reply.
    ///
    /// The session is destroyed before returning, on every path.
    pub async fn analyze_window(
        &self,
        window: &Window,
        original_map: &OriginalMap,
    ) -> Result<Option<AnalysisResult>, ModelError> {
        let session = self.model.create(self.session_config()).await?;
        let mut session = ScopedSession::new(session);
        let reply = session.prompt(&analysis_prompt(window)).await;
        drop(session);
        Ok(self.validator.parse(&reply?, original_map))
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            system_prompt: SYSTEM_PROMPT.to_string(),
            temperature: Some(self.config.temperature),
            top_k: Some(self.config.top_k),
            language: Some(self.config.language.clone()),
        }
    }
}
