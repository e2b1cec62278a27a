//! MCP Server: exposes the PyMOL tools as an MCP endpoint.
//!
//! Transport-agnostic. Both the stdio and the SSE bindings hand each inbound
//! JSON message to [`McpServer::handle_message`] and forward whatever comes
//! back. Supported methods:
//! - `initialize`: server info and capabilities
//! - `ping`: health check
//! - `tools/list`: the fixed PyMOL tool list
//! - `tools/call`: execute a tool
//!
//! Notifications are accepted and never answered.

use serde_json::{Value, json};

use super::protocol::{
    self, INVALID_PARAMS, INVALID_REQUEST, Incoming, METHOD_NOT_FOUND, PARSE_ERROR, json_rpc_error,
    json_rpc_result,
};
use crate::tools::{ToolDispatcher, list_tools};

pub const SERVER_NAME: &str = "pymol-controller";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "Controls a running PyMOL instance through its XML-RPC server. \
Load or fetch structures, change representations and colors, move the camera, make selections, \
inspect atoms and chains, and render images. Use pymol_do for any PyMOL command without a \
dedicated tool.";

/// Routes MCP methods to the tool layer.
#[derive(Clone)]
pub struct McpServer {
    dispatcher: ToolDispatcher,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Handle one line of a newline-delimited stream. Blank lines are skipped.
    pub async fn handle_line(&self, line: &str) -> Option<Value> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_message(message).await,
            Err(e) => {
                tracing::warn!("MCP: unparsable message: {}", e);
                Some(json_rpc_error(Value::Null, PARSE_ERROR, "Parse error"))
            }
        }
    }

    /// Handle one decoded JSON-RPC message. `None` means nothing is sent back.
    pub async fn handle_message(&self, message: Value) -> Option<Value> {
        match protocol::classify(&message) {
            Incoming::Request { id, method, params } => {
                tracing::debug!(method = %method, "MCP: incoming request");
                Some(self.handle_request(id, &method, &params).await)
            }
            Incoming::Notification { method } => {
                tracing::debug!(method = %method, "MCP: notification");
                None
            }
            Incoming::Response => None,
            Incoming::Invalid { id } => Some(json_rpc_error(id, INVALID_REQUEST, "Invalid Request")),
        }
    }

    async fn handle_request(&self, id: Value, method: &str, params: &Value) -> Value {
        match method {
            "initialize" => handle_initialize(id, params),
            "ping" => json_rpc_result(id, json!({})),
            "tools/list" => handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, params).await,
            _ => json_rpc_error(id, METHOD_NOT_FOUND, &format!("Method not found: {}", method)),
        }
    }

    // ── tools/call ──────────────────────────────────────────────────────────

    async fn handle_tools_call(&self, id: Value, params: &Value) -> Value {
        let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
        if tool_name.is_empty() {
            return json_rpc_error(id, INVALID_PARAMS, "Missing 'name' in params");
        }
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        tracing::info!(tool = %tool_name, "MCP: tools/call");

        let result = self.dispatcher.dispatch(tool_name, &arguments).await;
        match serde_json::to_value(&result) {
            Ok(result) => json_rpc_result(id, result),
            Err(e) => json_rpc_error(id, protocol::INTERNAL_ERROR, &e.to_string()),
        }
    }
}

// ── initialize ──────────────────────────────────────────────────────────────

fn handle_initialize(id: Value, params: &Value) -> Value {
    let requested = params.get("protocolVersion").and_then(|v| v.as_str());
    let version = protocol::negotiate_version(requested);
    tracing::info!(
        requested = requested.unwrap_or("(none)"),
        negotiated = version,
        "MCP: initialize"
    );

    json_rpc_result(
        id,
        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "instructions": INSTRUCTIONS
        }),
    )
}

// ── tools/list ──────────────────────────────────────────────────────────────

fn handle_tools_list(id: Value) -> Value {
    let tools: Vec<Value> = list_tools().iter().map(|t| t.to_mcp()).collect();
    json_rpc_result(id, json!({ "tools": tools }))
}
