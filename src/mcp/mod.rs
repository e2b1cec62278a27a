//! MCP (Model Context Protocol) server side.
//!
//! **Server** (`McpServer`): routes JSON-RPC 2.0 methods to the PyMOL tools.
//!
//! **Bindings**: `stdio` (newline-delimited, one client) and `sse` (HTTP
//! event stream plus POST endpoint, many sessions).
//!
//! Spec: <https://spec.modelcontextprotocol.io/2024-11-05/>

pub mod protocol;
pub mod server;
pub mod sse;
pub mod stdio;

pub use server::{McpServer, SERVER_NAME, SERVER_VERSION};
pub use sse::SseSessions;
