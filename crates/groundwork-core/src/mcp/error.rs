use thiserror::Error;

use crate::retry::Transient;

/// Classified failures for MCP client calls.
///
/// Every failure path produces exactly one of these kinds; nothing is
/// swallowed and no operation reports an empty success in place of an error.
#[derive(Debug, Error)]
pub enum McpError {
    /// Network-level failure: connection refused, DNS, timeout, or a non-2xx
    /// status with no more specific classification.
    #[error("mcp transport failure: {message}")]
    Transport {
        /// HTTP status, when the failure happened after a response arrived.
        status: Option<u16>,
        message: String,
    },

    /// HTTP 401 on any call. The credential is missing or was rejected;
    /// retrying without a new token will not help.
    #[error("mcp authentication failed (HTTP 401)")]
    Authentication,

    /// HTTP 404 on invocation. The server does not know the tool.
    #[error("mcp tool not found: {0}")]
    ToolNotFound(String),

    /// Body was not valid JSON or did not match the expected envelope.
    #[error("mcp protocol violation: {0}")]
    Protocol(String),

    /// The server answered with a JSON-RPC error object.
    #[error("mcp server error: {0}")]
    Server(String),

    /// Caller-side mistake caught before any network I/O.
    #[error("invalid mcp request: {0}")]
    InvalidRequest(String),
}

impl McpError {
    /// HTTP status attached to this failure, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Authentication => Some(401),
            Self::ToolNotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl Transient for McpError {
    fn is_transient(&self) -> bool {
        matches!(self, McpError::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_transient() {
        let transport = McpError::Transport {
            status: Some(503),
            message: "upstream unavailable".into(),
        };
        assert!(transport.is_transient());

        assert!(!McpError::Authentication.is_transient());
        assert!(!McpError::ToolNotFound("createTask".into()).is_transient());
        assert!(!McpError::Server("bad input".into()).is_transient());
        assert!(!McpError::Protocol("truncated body".into()).is_transient());
        assert!(!McpError::InvalidRequest("empty tool name".into()).is_transient());
    }

    #[test]
    fn status_is_exposed_for_http_failures() {
        let transport = McpError::Transport {
            status: Some(500),
            message: "HTTP 500".into(),
        };
        assert_eq!(transport.status(), Some(500));
        assert_eq!(McpError::Authentication.status(), Some(401));
        assert_eq!(McpError::ToolNotFound("x".into()).status(), Some(404));
        assert_eq!(McpError::Server("x".into()).status(), None);
    }
}
