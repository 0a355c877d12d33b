//! Prompt analysis - asks a generative model which candidate is the total
//!
//! - [`Preprocessor`]: dedup, length ranking and greedy windowing
//! - [`ModelAnalyzer`]: sequential window analysis with a confidence gate
//! - [`ResultValidator`]: defensive parsing of free-text model replies
//! - [`LanguageModel`]: the capability surface, plus [`ScriptedLanguageModel`]

pub mod analyzer;
pub mod errors;
pub mod model;
pub mod preprocess;
pub mod prompt;
pub mod scripted;
pub mod validator;

pub use analyzer::{AnalyzerConfig, ModelAnalyzer, WindowVerdict};
pub use errors::ModelError;
pub use model::{
    Availability, AvailabilityOptions, LanguageModel, ModelSession, ScopedSession, SessionConfig,
};
pub use preprocess::{serialized_len, AnalysisPlan, Preprocessed, Preprocessor};
pub use prompt::{analysis_prompt, SYSTEM_PROMPT};
pub use scripted::ScriptedLanguageModel;
pub use validator::{extract_json_object, ResultValidator};
