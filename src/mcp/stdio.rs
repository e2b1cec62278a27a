//! Newline-delimited JSON-RPC over a byte stream.
//!
//! ```text
//!   MCP client ──stdin──▶ serve() ──▶ McpServer ──▶ PyMOL
//!              ◀─stdout──        ◀──
//! ```
//!
//! stdout carries protocol messages only; logging goes to stderr.

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;

use super::server::McpServer;

/// Responses waiting for the writer.
const OUTBOX_CAPACITY: usize = 64;

/// Serve one client until `reader` hits EOF and every in-flight message has
/// been answered. Each message is handled on its own task, so a slow remote
/// call never holds up later requests; responses are written whole, in
/// completion order, by this task alone.
pub async fn serve<R, W>(server: &McpServer, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let (tx, mut rx) = mpsc::channel::<Value>(OUTBOX_CAPACITY);
    // Dropped at EOF; `rx` then drains until the last in-flight task is done.
    let mut inbox = Some(tx);

    loop {
        tokio::select! {
            line = lines.next_line(), if inbox.is_some() => match line? {
                Some(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let Some(tx) = inbox.clone() else { continue };
                    let server = server.clone();
                    tokio::spawn(async move {
                        if let Some(response) = server.handle_line(&line).await {
                            // The writer only goes away when serving failed.
                            let _ = tx.send(response).await;
                        }
                    });
                }
                None => {
                    tracing::info!("MCP: client disconnected (EOF)");
                    inbox = None;
                }
            },
            response = rx.recv() => match response {
                Some(response) => write_message(&mut writer, &response).await?,
                None => return Ok(()),
            },
        }
    }
}

/// Serve on the process's stdin/stdout.
pub async fn serve_stdio(server: &McpServer) -> std::io::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    serve(server, reader, writer).await
}

async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, message: &Value) -> std::io::Result<()> {
    let json = serde_json::to_string(message)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::config::EndpointConfig;
    use crate::error::RpcError;
    use crate::pymol::connection::testing::disconnected;
    use crate::pymol::{Connector, PymolConnection, RemoteEndpoint, XmlValue};
    use crate::tools::{Tool, ToolDispatcher};

    async fn run(input: &str) -> Vec<Value> {
        let server = McpServer::new(ToolDispatcher::new(disconnected()));
        let mut out = Vec::new();
        serve(&server, input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn by_id<'a>(responses: &'a [Value], id: Value) -> &'a Value {
        responses
            .iter()
            .find(|r| r["id"] == id)
            .unwrap_or_else(|| panic!("no response with id {id}"))
    }

    /// PyMOL that never finishes a `ray`; everything else answers `nil`.
    struct StallingPymol;

    #[async_trait]
    impl RemoteEndpoint for StallingPymol {
        async fn call(&self, method: &str, _params: &[XmlValue]) -> Result<XmlValue, RpcError> {
            if method == "ray" {
                return std::future::pending().await;
            }
            Ok(XmlValue::Nil)
        }
    }

    impl Connector for StallingPymol {
        fn open(&self, _url: &str) -> Arc<dyn RemoteEndpoint> {
            Arc::new(StallingPymol)
        }
    }

    #[tokio::test]
    async fn handshake_then_list_then_call() {
        let input = [
            json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize",
                    "params": { "protocolVersion": "2025-03-26" } }),
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
            json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                    "params": { "name": "pymol_zoom", "arguments": {} } }),
        ]
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("\n");

        let responses = run(&input).await;
        assert_eq!(responses.len(), 3);
        assert_eq!(
            by_id(&responses, json!(1))["result"]["protocolVersion"],
            "2025-03-26"
        );
        assert_eq!(
            by_id(&responses, json!(2))["result"]["tools"]
                .as_array()
                .unwrap()
                .len(),
            Tool::ALL.len()
        );
        assert_eq!(by_id(&responses, json!(3))["result"]["isError"], true);
    }

    #[tokio::test]
    async fn garbage_line_gets_parse_error_and_loop_continues() {
        let input = "garbage\n\n{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"ping\"}\n";
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(by_id(&responses, Value::Null)["error"]["code"], -32700);
        assert_eq!(by_id(&responses, json!(4))["result"], json!({}));
    }

    #[tokio::test]
    async fn empty_input_ends_cleanly() {
        assert!(run("").await.is_empty());
    }

    #[tokio::test]
    async fn stalled_tool_call_does_not_hold_up_later_requests() {
        let connection = Arc::new(PymolConnection::with_connector(
            EndpointConfig::default(),
            Arc::new(StallingPymol),
        ));
        assert!(connection.connect().await);
        let server = McpServer::new(ToolDispatcher::new(connection));

        let (client, server_io) = tokio::io::duplex(4096);
        let (server_read, server_write) = tokio::io::split(server_io);
        tokio::spawn(async move {
            let _ = serve(&server, BufReader::new(server_read), server_write).await;
        });

        let (mut client_read, mut client_write) = tokio::io::split(client);
        let ray = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                          "params": { "name": "pymol_ray", "arguments": {} } });
        let ping = json!({ "jsonrpc": "2.0", "id": 2, "method": "ping" });
        client_write
            .write_all(format!("{ray}\n{ping}\n").as_bytes())
            .await
            .unwrap();

        let mut buf = vec![0u8; 4096];
        let n = tokio::time::timeout(Duration::from_secs(2), client_read.read(&mut buf))
            .await
            .expect("ping not answered while pymol_ray is in flight")
            .unwrap();
        let line = std::str::from_utf8(&buf[..n]).unwrap().lines().next().unwrap();
        let response: Value = serde_json::from_str(line).unwrap();
        assert_eq!(response["id"], 2);
        assert_eq!(response["result"], json!({}));
    }
}
