use axum::Json;
use axum::extract::State;

use crate::mcp::{SERVER_NAME, SERVER_VERSION};
use crate::models::{EndpointDescriptions, HealthResponse, ServerSummary};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Info
// ---------------------------------------------------------------------------

pub async fn root(State(state): State<AppState>) -> Json<ServerSummary> {
    Json(ServerSummary {
        name: "PyMOL MCP Server".to_string(),
        version: SERVER_VERSION.to_string(),
        endpoints: EndpointDescriptions {
            sse: "SSE event stream; MCP clients connect here".to_string(),
            messages: "POST endpoint for client messages (session_id query parameter)".to_string(),
            health: "Health check".to_string(),
        },
        transport: "sse".to_string(),
        pymol_connected: state.pymol_connected(),
    })
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        pymol_connected: state.pymol_connected(),
        server: SERVER_NAME.to_string(),
    })
}
