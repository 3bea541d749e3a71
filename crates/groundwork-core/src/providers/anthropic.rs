//! Anthropic Messages API provider, non-streaming.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::debug;

use super::provider::{CompletionError, CompletionProvider, CompletionRequest};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Generation runs much longer than a plain fetch.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

pub struct AnthropicProvider {
    base_url: String,
    api_key: String,
    model: String,
    http: Client,
}

impl AnthropicProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(COMPLETION_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            http,
        })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{"role": "user", "content": request.prompt}],
        });

        debug!("completion: requesting {} tokens from {}", request.max_tokens, self.model);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => return Err(CompletionError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(CompletionError::RateLimited),
            status if !status.is_success() => {
                let message: String = response
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(200)
                    .collect();
                return Err(CompletionError::Http {
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Protocol(format!("completion response: {e}")))?;

        let text = body["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(CompletionError::Protocol(
                "response carried no text content".into(),
            ));
        }
        Ok(text)
    }
}
