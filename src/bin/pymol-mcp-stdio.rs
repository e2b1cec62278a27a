use std::sync::Arc;

use clap::Parser;

use pymol_mcp_server::config::StdioArgs;
use pymol_mcp_server::mcp::McpServer;
use pymol_mcp_server::mcp::stdio::serve_stdio;
use pymol_mcp_server::pymol::PymolConnection;
use pymol_mcp_server::telemetry;
use pymol_mcp_server::tools::ToolDispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = StdioArgs::parse();
    // stdout belongs to the protocol.
    telemetry::init_tracing(true);

    let connection = Arc::new(PymolConnection::new(args.pymol.endpoint()));
    if !connection.connect().await {
        tracing::warn!("PyMOL not reachable; tools will report not connected until restart");
    }

    let server = McpServer::new(ToolDispatcher::new(connection));
    tracing::info!("PyMOL MCP server ready on stdio");
    serve_stdio(&server).await?;

    Ok(())
}
