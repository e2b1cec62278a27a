use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use pymol_mcp_server::config::ServerArgs;
use pymol_mcp_server::state::AppState;
use pymol_mcp_server::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = ServerArgs::parse();
    telemetry::init_tracing(false);

    let state = AppState::from_config(args.pymol.endpoint());

    // ── One connect attempt; serving continues either way ──
    if !state.connection.connect().await {
        let cfg = state.connection.config();
        tracing::warn!(
            "PyMOL not reachable on {}:{}-{}; tools will report not connected. Start PyMOL with `pymol -R`.",
            cfg.host,
            cfg.base_port,
            cfg.base_port.saturating_add(pymol_mcp_server::config::PORT_PROBE_WINDOW - 1)
        );
    }

    let app = pymol_mcp_server::create_router(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        );

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("PyMOL MCP server listening on http://{}", listener.local_addr()?);
    tracing::info!("MCP clients connect to http://{}/sse", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
