pub mod config;
pub mod error;
pub mod handlers;
pub mod mcp;
pub mod models;
pub mod pymol;
pub mod state;
pub mod telemetry;
pub mod tools;

use axum::Router;
use axum::routing::{get, post};

use state::AppState;

/// Build the application router with the given state.
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a network port.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Info
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // MCP over SSE
        .route("/sse", get(mcp::sse::sse_handler))
        .route("/messages/", post(mcp::sse::messages_handler))
        .route("/messages", post(mcp::sse::messages_handler))
        .with_state(state)
}
