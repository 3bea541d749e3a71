use async_trait::async_trait;
use thiserror::Error;

use crate::retry::Transient;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion transport failure: {0}")]
    Transport(String),
    #[error("completion API key rejected (HTTP 401)")]
    InvalidApiKey,
    #[error("completion rate limit hit (HTTP 429)")]
    RateLimited,
    #[error("completion service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("completion protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        CompletionError::Transport(err.to_string())
    }
}

impl Transient for CompletionError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::Transport(_) | CompletionError::RateLimited
        )
    }
}

/// One text-generation call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 4000,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text-generation seam. The workflow depends on this trait, not on any
/// concrete vendor client.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
