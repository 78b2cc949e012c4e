// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! JSON-RPC 2.0 message shapes.
//!
//! A message with an `id` is a request and gets exactly one response
//! carrying either `result` or `error`; a message without an `id` is a
//! notification and gets none. Error codes follow JSON-RPC conventions
//! plus the LSP-reserved `-32800..-32803` block.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The protocol version string carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC and LSP-reserved error codes.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i64 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// The request was cancelled by the client.
    pub const REQUEST_CANCELLED: i64 = -32800;
    /// The content was modified while the request ran.
    pub const CONTENT_MODIFIED: i64 = -32801;
    /// The server cancelled the request.
    pub const SERVER_CANCELLED: i64 = -32802;
    /// The request failed for a documented reason.
    pub const REQUEST_FAILED: i64 = -32803;
}

/// An incoming request or notification.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestMessage {
    /// Protocol version; must be `"2.0"`.
    #[serde(default)]
    pub jsonrpc: String,
    /// Request id. Absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    /// The method name, e.g. `textDocument/hover`.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

impl RequestMessage {
    /// Returns true if this message expects no response.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// An outgoing response: exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMessage {
    /// Protocol version; always `"2.0"`.
    pub jsonrpc: &'static str,
    /// The id of the request being answered; `null` when the request id
    /// could not be read.
    pub id: Value,
    /// Successful result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl ResponseMessage {
    /// Builds a success response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    /// A JSON-RPC or LSP-reserved error code.
    pub code: i64,
    /// A short human-readable description.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_with_id_is_not_notification() {
        let request: RequestMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": "1",
            "method": "textDocument/hover",
            "params": {"position": {"line": 0, "character": 0}}
        }))
        .expect("deserialize");
        assert!(!request.is_notification());
        assert_eq!(request.method, "textDocument/hover");
    }

    #[test]
    fn message_without_id_is_notification() {
        let request: RequestMessage = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "textDocument/didOpen",
            "params": {}
        }))
        .expect("deserialize");
        assert!(request.is_notification());
    }

    #[test]
    fn success_response_has_no_error_member() {
        let response = ResponseMessage::success(json!("7"), json!({"ok": true}));
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], "7");
        assert_eq!(value["result"]["ok"], true);
        assert!(value.get("error").is_none());
    }

    #[test]
    fn failure_response_has_no_result_member() {
        let response =
            ResponseMessage::failure(json!(3), error_codes::METHOD_NOT_FOUND, "unknown method");
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["error"]["message"], "unknown method");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn error_code_values() {
        assert_eq!(error_codes::PARSE_ERROR, -32700);
        assert_eq!(error_codes::INVALID_REQUEST, -32600);
        assert_eq!(error_codes::METHOD_NOT_FOUND, -32601);
        assert_eq!(error_codes::INVALID_PARAMS, -32602);
        assert_eq!(error_codes::INTERNAL_ERROR, -32603);
        assert_eq!(error_codes::REQUEST_CANCELLED, -32800);
        assert_eq!(error_codes::REQUEST_FAILED, -32803);
    }
}
