use thiserror::Error;

/// Errors emitted by generative-model backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The capability cannot be used on this host.
    #[error("language model unavailable: {0}")]
    Unavailable(String),

    /// Session creation was rejected.
    #[error("failed to create model session: {0}")]
    Session(String),

    /// A prompt was sent to a session that was already destroyed.
    #[error("model session already destroyed")]
    Destroyed,

    /// The backend failed while answering a prompt.
    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl ModelError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt(message.into())
    }
}
