//! JSON-RPC 2.0 framing for MCP.

use serde_json::{Value, json};

pub const JSONRPC_VERSION: &str = "2.0";

/// Newest first. Unsupported client versions get the first entry.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// What an inbound JSON value turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Has `method` and `id`; expects a response.
    Request { id: Value, method: String, params: Value },
    /// Has `method` but no `id`.
    Notification { method: String },
    /// A reply to something we never send; ignored.
    Response,
    /// Not a JSON-RPC message. `id` is echoed if one could be read.
    Invalid { id: Value },
}

pub fn classify(message: &Value) -> Incoming {
    let Some(obj) = message.as_object() else {
        return Incoming::Invalid { id: Value::Null };
    };

    let id = obj.get("id").cloned();
    match obj.get("method") {
        Some(Value::String(method)) => {
            let params = obj.get("params").cloned().unwrap_or(Value::Null);
            match id {
                Some(id) => Incoming::Request {
                    id,
                    method: method.clone(),
                    params,
                },
                None => Incoming::Notification {
                    method: method.clone(),
                },
            }
        }
        Some(_) => Incoming::Invalid {
            id: id.unwrap_or(Value::Null),
        },
        None if obj.contains_key("result") || obj.contains_key("error") => Incoming::Response,
        None => Incoming::Invalid {
            id: id.unwrap_or(Value::Null),
        },
    }
}

/// Echo the client's version when we speak it.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| **v == r))
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

pub fn json_rpc_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result
    })
}

pub fn json_rpc_error(id: Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_request_and_notification() {
        let req = json!({ "jsonrpc": "2.0", "id": 7, "method": "ping" });
        assert_eq!(
            classify(&req),
            Incoming::Request {
                id: json!(7),
                method: "ping".into(),
                params: Value::Null
            }
        );

        let note = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
        assert_eq!(
            classify(&note),
            Incoming::Notification {
                method: "notifications/initialized".into()
            }
        );
    }

    #[test]
    fn classifies_client_response_and_garbage() {
        assert_eq!(classify(&json!({ "id": 1, "result": {} })), Incoming::Response);
        assert_eq!(
            classify(&json!({ "id": "x", "method": 5 })),
            Incoming::Invalid { id: json!("x") }
        );
        assert_eq!(classify(&json!([1, 2])), Incoming::Invalid { id: Value::Null });
    }

    #[test]
    fn version_negotiation() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("1999-01-01")), "2025-06-18");
        assert_eq!(negotiate_version(None), "2025-06-18");
    }

    #[test]
    fn error_envelope() {
        let err = json_rpc_error(Value::Null, PARSE_ERROR, "Parse error");
        assert_eq!(err["error"]["code"], -32700);
        assert!(err["id"].is_null());
        assert_eq!(err["jsonrpc"], "2.0");
    }
}
