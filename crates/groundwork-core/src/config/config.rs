//! Runtime configuration. Values come from environment variables (serde
//! defaults), overridden by `~/.groundwork/config.json`, overridden in turn
//! by a `.groundwork.json` next to the working directory. No globals; the
//! loaded struct is passed to whoever needs it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::mcp::McpClientConfig;
use crate::providers::anthropic::ANTHROPIC_API_BASE;
use crate::retry::RetryPolicy;
use crate::search::brave::BRAVE_API_BASE;

const LOCAL_CONFIG: &str = ".groundwork.json";

// ── Defaults ─────────────────────────────────────────────────────────────────

fn env_string(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str, fallback: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn default_brave_api_key() -> String {
    env_string("BRAVE_API_KEY")
}

fn default_anthropic_api_key() -> String {
    env_string("ANTHROPIC_API_KEY")
}

fn default_mcp_server_url() -> String {
    env::var("MCP_SERVER_URL").unwrap_or_else(|_| "http://localhost:8787/mcp".into())
}

fn default_mcp_auth_token() -> Option<String> {
    env_opt("MCP_AUTH_TOKEN")
}

fn default_github_token() -> Option<String> {
    env_opt("GITHUB_TOKEN")
}

fn default_model() -> String {
    env::var("GROUNDWORK_MODEL").unwrap_or_else(|_| "claude-3-5-sonnet-20241022".into())
}

fn default_anthropic_base_url() -> String {
    env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| ANTHROPIC_API_BASE.into())
}

fn default_search_base_url() -> String {
    env::var("BRAVE_SEARCH_BASE_URL").unwrap_or_else(|_| BRAVE_API_BASE.into())
}

fn default_max_search_results() -> u32 {
    env_parse("GROUNDWORK_MAX_SEARCH_RESULTS", 10)
}

fn default_max_concurrent_requests() -> usize {
    env_parse("GROUNDWORK_MAX_CONCURRENT", 5)
}

fn default_request_timeout_secs() -> u64 {
    env_parse("GROUNDWORK_TIMEOUT_SECS", 30)
}

fn default_max_retries() -> u32 {
    env_parse("GROUNDWORK_MAX_RETRIES", 3)
}

fn default_retry_base_delay_ms() -> u64 {
    env_parse("GROUNDWORK_RETRY_BASE_DELAY_MS", 500)
}

// ── GroundworkConfig ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundworkConfig {
    #[serde(default = "default_brave_api_key")]
    pub brave_api_key: String,
    #[serde(default = "default_anthropic_api_key")]
    pub anthropic_api_key: String,
    #[serde(default = "default_mcp_server_url")]
    pub mcp_server_url: String,
    /// Bearer credential for the MCP server. Falls back to `github_token`
    /// when unset (the task server authenticates through GitHub).
    #[serde(default = "default_mcp_auth_token")]
    pub mcp_auth_token: Option<String>,
    #[serde(default = "default_github_token")]
    pub github_token: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_anthropic_base_url")]
    pub anthropic_base_url: String,
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for GroundworkConfig {
    fn default() -> Self {
        Self {
            brave_api_key: default_brave_api_key(),
            anthropic_api_key: default_anthropic_api_key(),
            mcp_server_url: default_mcp_server_url(),
            mcp_auth_token: default_mcp_auth_token(),
            github_token: default_github_token(),
            model: default_model(),
            anthropic_base_url: default_anthropic_base_url(),
            search_base_url: default_search_base_url(),
            max_search_results: default_max_search_results(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl GroundworkConfig {
    /// Environment defaults, then `~/.groundwork/config.json`, then the local
    /// `.groundwork.json`. Missing or malformed files are skipped.
    pub fn load() -> Self {
        let mut value = Value::Object(Default::default());
        if let Some(home) = Self::home_config_path() {
            merge_file(&mut value, &home);
        }
        merge_file(&mut value, Path::new(LOCAL_CONFIG));

        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                warn!("config: falling back to environment defaults: {e}");
                Self::default()
            }
        }
    }

    /// Load from one explicit file; keys it omits fall back to the
    /// environment defaults.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".groundwork").join("config.json"))
    }

    pub fn mcp_client_config(&self) -> McpClientConfig {
        let mut config = McpClientConfig::new(self.mcp_server_url.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_max_retries(self.max_retries);
        if let Some(token) = self.mcp_auth_token.as_ref().or(self.github_token.as_ref()) {
            config = config.with_bearer_token(token.clone());
        }
        config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    /// The research workflow needs both external services; fail before any
    /// I/O when a key is missing.
    pub fn validate_for_research(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.brave_api_key.is_empty(),
            "BRAVE_API_KEY is not set (required for web search)"
        );
        anyhow::ensure!(
            !self.anthropic_api_key.is_empty(),
            "ANTHROPIC_API_KEY is not set (required for PRP generation)"
        );
        Ok(())
    }
}

/// Overlay the JSON object in `path` onto `target`, top-level key by key.
fn merge_file(target: &mut Value, path: &Path) {
    let Ok(text) = fs::read_to_string(path) else {
        return;
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => {
            if let Value::Object(target_map) = target {
                for (key, value) in map {
                    target_map.insert(key, value);
                }
            }
        }
        _ => warn!("config: ignoring malformed {}", path.display()),
    }
}
