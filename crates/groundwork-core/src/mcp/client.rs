use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::error::McpError;
use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse};

const CLIENT_UA: &str = concat!("groundwork/", env!("CARGO_PKG_VERSION"));

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 3;

// ── Configuration ────────────────────────────────────────────────────────────

/// Connection settings for one MCP server.
#[derive(Debug, Clone)]
pub struct McpClientConfig {
    /// Server base URL, e.g. `http://localhost:8787/mcp`.
    pub base_url: String,
    /// Sent as `Authorization: Bearer <token>` on every request when set.
    pub bearer_token: Option<String>,
    /// Bound on each individual HTTP call.
    pub timeout: Duration,
    /// Retry budget for `retry::with_retry`; the client itself never retries.
    pub max_retries: u32,
}

impl McpClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ToolsListResult {
    tools: Vec<ToolEntry>,
}

/// One entry in a `tools/list` result. Only the name is required; anything
/// else the server includes is ignored.
#[derive(Debug, Deserialize)]
struct ToolEntry {
    name: String,
}

// ── McpClient ────────────────────────────────────────────────────────────────

/// One logical session against an MCP tool server.
///
/// Owns the HTTP transport plus the tool names from the most recent
/// successful discovery. Makes one call at a time; the `&mut self` receivers
/// are the synchronization story, so sharing a session across tasks takes an
/// external mutex.
pub struct McpClient {
    config: McpClientConfig,
    http: Option<Client>,
    tools: Option<Vec<String>>,
}

impl McpClient {
    /// Open a session: allocate the transport with the configured timeout and
    /// baseline headers. No network traffic happens until the first call.
    pub fn new(config: McpClientConfig) -> Result<Self, McpError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_UA));
        if let Some(token) = &config.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                McpError::InvalidRequest("bearer token is not a valid header value".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            config,
            http: Some(http),
            tools: None,
        })
    }

    /// Tool names from the most recent successful discovery, in server order.
    /// `None` until discovery has succeeded once.
    pub fn cached_tools(&self) -> Option<&[String]> {
        self.tools.as_deref()
    }

    /// True when discovery has run and the server listed `name`.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools
            .as_ref()
            .map_or(false, |tools| tools.iter().any(|t| t == name))
    }

    /// Ask the server for its tool list.
    ///
    /// On success the cached list is replaced wholesale; any failure leaves
    /// the previous cache untouched.
    pub async fn discover_tools(&mut self) -> Result<Vec<String>, McpError> {
        let request = JsonRpcRequest::new("tools/list", json!({}));
        let result = self.post_rpc("tools/list", &request, None).await?;

        let parsed: ToolsListResult = serde_json::from_value(Value::Object(result))
            .map_err(|e| McpError::Protocol(format!("tools/list result: {e}")))?;
        let names: Vec<String> = parsed.tools.into_iter().map(|t| t.name).collect();

        info!("mcp: discovered {} tools", names.len());
        self.tools = Some(names.clone());
        Ok(names)
    }

    /// Invoke `name` with `arguments` and return the JSON-RPC `result`
    /// mapping exactly as the server sent it.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Map<String, Value>, McpError> {
        if name.is_empty() {
            return Err(McpError::InvalidRequest("tool name must not be empty".into()));
        }

        let request = JsonRpcRequest::new(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        );
        debug!("mcp: calling tool {name}");
        self.post_rpc("tools/call", &request, Some(name)).await
    }

    /// Release the transport. Safe to call repeatedly and before any call;
    /// dropping the session releases it as well. Calls issued after close
    /// fail locally with `InvalidRequest`.
    pub fn close(&mut self) {
        if self.http.take().is_some() {
            debug!("mcp: session closed");
        }
    }

    async fn post_rpc(
        &self,
        path: &str,
        request: &JsonRpcRequest,
        invoked_tool: Option<&str>,
    ) -> Result<Map<String, Value>, McpError> {
        let http = self
            .http
            .as_ref()
            .ok_or_else(|| McpError::InvalidRequest("session is closed".into()))?;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);

        let response = http.post(&url).json(request).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(McpError::Authentication);
        }
        if status == StatusCode::NOT_FOUND {
            // Discovery has no "not found" concept; only an invocation maps
            // 404 to a missing tool.
            if let Some(tool) = invoked_tool {
                return Err(McpError::ToolNotFound(tool.to_string()));
            }
        }
        if !status.is_success() {
            return Err(McpError::Transport {
                status: Some(status.as_u16()),
                message: format!("{url} returned HTTP {}", status.as_u16()),
            });
        }

        let bytes = response.bytes().await?;
        let body: JsonRpcResponse = serde_json::from_slice(&bytes)
            .map_err(|e| McpError::Protocol(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(error) = body.error {
            return Err(McpError::Server(error.display_message()));
        }

        match body.result {
            Some(Value::Object(map)) => Ok(map),
            Some(_) => Err(McpError::Protocol("result is not a JSON object".into())),
            None => Err(McpError::Protocol(
                "response carries neither result nor error".into(),
            )),
        }
    }
}
