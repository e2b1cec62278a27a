use std::sync::Arc;

use crate::config::EndpointConfig;
use crate::mcp::{McpServer, SseSessions};
use crate::pymol::PymolConnection;
use crate::tools::ToolDispatcher;

// ── AppState ────────────────────────────────────────────────────────────────

/// Shared state of the networked binding. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub connection: Arc<PymolConnection>,
    pub mcp: McpServer,
    pub sessions: Arc<SseSessions>,
}

impl AppState {
    /// Wire the MCP server to `connection`. Does not connect.
    pub fn new(connection: Arc<PymolConnection>) -> Self {
        let mcp = McpServer::new(ToolDispatcher::new(connection.clone()));
        Self {
            connection,
            mcp,
            sessions: Arc::new(SseSessions::new()),
        }
    }

    /// State over a real HTTP connector to `config`.
    pub fn from_config(config: EndpointConfig) -> Self {
        Self::new(Arc::new(PymolConnection::new(config)))
    }

    pub fn pymol_connected(&self) -> bool {
        self.connection.is_connected()
    }
}
