use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed JSON-RPC id. A session never has more than one call in flight, so
/// responses need no id correlation.
pub const CALL_ID: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id: CALL_ID,
            method: method.into(),
            params,
        }
    }
}

/// Response envelope. Servers are not required to echo the `jsonrpc` marker,
/// so every field is optional and validated by the client, not by serde.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    /// Server-supplied message, with a stable fallback when the server sent
    /// an error object without one.
    pub fn display_message(&self) -> String {
        match &self.message {
            Some(message) if !message.is_empty() => message.clone(),
            _ => match self.code {
                Some(code) => format!("server returned error code {code}"),
                None => "server returned an unspecified error".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_fixed_id_and_version() {
        let request = JsonRpcRequest::new("tools/list", json!({}));
        let encoded = serde_json::to_value(&request).unwrap();

        assert_eq!(encoded["jsonrpc"], "2.0");
        assert_eq!(encoded["id"], 1);
        assert_eq!(encoded["method"], "tools/list");
        assert_eq!(encoded["params"], json!({}));
    }

    #[test]
    fn response_fields_are_all_optional() {
        let response: JsonRpcResponse = serde_json::from_str("{}").unwrap();
        assert!(response.id.is_none());
        assert!(response.result.is_none());
        assert!(response.error.is_none());
    }

    #[test]
    fn error_message_falls_back_when_absent() {
        let error: JsonRpcErrorObject =
            serde_json::from_value(json!({ "code": -32600 })).unwrap();
        assert_eq!(error.display_message(), "server returned error code -32600");

        let error: JsonRpcErrorObject = serde_json::from_value(json!({})).unwrap();
        assert_eq!(error.display_message(), "server returned an unspecified error");

        let error: JsonRpcErrorObject =
            serde_json::from_value(json!({ "message": "bad input" })).unwrap();
        assert_eq!(error.display_message(), "bad input");
    }
}
