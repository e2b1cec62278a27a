// Full SSE round trip through the router: open a session, POST into it,
// read the response event back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use pymol_mcp_server::config::EndpointConfig;
use pymol_mcp_server::error::RpcError;
use pymol_mcp_server::pymol::{Connector, PymolConnection, RemoteEndpoint, XmlValue};
use pymol_mcp_server::state::AppState;

fn test_state() -> AppState {
    AppState::from_config(EndpointConfig::new("127.0.0.1", 9123))
}

/// Next SSE event as `(event, data)`, skipping keep-alive comments.
async fn next_event(body: &mut Body) -> (String, String) {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), body.frame())
            .await
            .expect("timed out waiting for SSE event")
            .expect("stream ended")
            .unwrap();
        let Ok(data) = frame.into_data() else { continue };
        let text = String::from_utf8(data.to_vec()).unwrap();

        let mut event = String::new();
        let mut payload = String::new();
        for line in text.lines() {
            if let Some(v) = line.strip_prefix("event:") {
                event = v.trim().to_string();
            } else if let Some(v) = line.strip_prefix("data:") {
                payload.push_str(v.trim_start());
            }
        }
        if !event.is_empty() {
            return (event, payload);
        }
    }
}

async fn open_session(app: &axum::Router) -> (Body, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/sse").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    let mut body = response.into_body();
    let (event, endpoint) = next_event(&mut body).await;
    assert_eq!(event, "endpoint");
    (body, endpoint)
}

fn post(uri: &str, message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(message.to_string()))
        .unwrap()
}

#[tokio::test]
async fn endpoint_event_announces_session_path() {
    let app = pymol_mcp_server::create_router(test_state());
    let (_body, endpoint) = open_session(&app).await;

    let session_id = endpoint
        .strip_prefix("/messages/?session_id=")
        .expect("endpoint path");
    assert_eq!(session_id.len(), 32);
    assert!(session_id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn posted_request_is_answered_on_the_stream() {
    let app = pymol_mcp_server::create_router(test_state());
    let (mut body, endpoint) = open_session(&app).await;

    let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" });
    let response = app
        .clone()
        .oneshot(post(&endpoint, &request.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (event, data) = next_event(&mut body).await;
    assert_eq!(event, "message");
    let message: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(message["id"], 1);
    assert_eq!(message["result"]["tools"].as_array().unwrap().len(), 21);
}

#[tokio::test]
async fn tool_call_without_pymol_is_in_band_error() {
    let app = pymol_mcp_server::create_router(test_state());
    let (mut body, endpoint) = open_session(&app).await;

    let request = json!({
        "jsonrpc": "2.0", "id": "c1", "method": "tools/call",
        "params": { "name": "pymol_fetch", "arguments": { "code": "1abc" } }
    });
    let response = app
        .clone()
        .oneshot(post(&endpoint, &request.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (_, data) = next_event(&mut body).await;
    let message: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(message["id"], "c1");
    assert_eq!(message["result"]["isError"], true);
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let app = pymol_mcp_server::create_router(test_state());
    let (_body, endpoint) = open_session(&app).await;

    let response = app.clone().oneshot(post(&endpoint, "not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_is_removed_when_stream_is_dropped() {
    let state = test_state();
    let app = pymol_mcp_server::create_router(state.clone());
    let (body, endpoint) = open_session(&app).await;
    assert_eq!(state.sessions.len(), 1);

    drop(body);
    assert!(state.sessions.is_empty());

    let response = app
        .clone()
        .oneshot(post(&endpoint, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// PyMOL that never finishes a `ray` and counts 7 atoms in anything.
struct StallingPymol;

#[async_trait]
impl RemoteEndpoint for StallingPymol {
    async fn call(&self, method: &str, _params: &[XmlValue]) -> Result<XmlValue, RpcError> {
        match method {
            "ray" => std::future::pending().await,
            "count_atoms" => Ok(XmlValue::Int(7)),
            _ => Ok(XmlValue::Nil),
        }
    }
}

impl Connector for StallingPymol {
    fn open(&self, _url: &str) -> Arc<dyn RemoteEndpoint> {
        Arc::new(StallingPymol)
    }
}

#[tokio::test]
async fn concurrent_sessions_are_isolated_and_independent() {
    let connection = Arc::new(PymolConnection::with_connector(
        EndpointConfig::default(),
        Arc::new(StallingPymol),
    ));
    assert!(connection.connect().await);
    let app = pymol_mcp_server::create_router(AppState::new(connection));

    let (mut body_a, endpoint_a) = open_session(&app).await;
    let (mut body_b, endpoint_b) = open_session(&app).await;
    assert_ne!(endpoint_a, endpoint_b);

    let ray = json!({
        "jsonrpc": "2.0", "id": "a-ray", "method": "tools/call",
        "params": { "name": "pymol_ray", "arguments": { "width": 4000, "height": 3000 } }
    });
    let response = app.clone().oneshot(post(&endpoint_a, &ray.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // Session B is served while A's render is still in flight.
    let count = json!({
        "jsonrpc": "2.0", "id": "b-count", "method": "tools/call",
        "params": { "name": "pymol_count_atoms", "arguments": {} }
    });
    let response = app.clone().oneshot(post(&endpoint_b, &count.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (event, data) = next_event(&mut body_b).await;
    assert_eq!(event, "message");
    let message: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(message["id"], "b-count");
    assert_eq!(message["result"]["content"][0]["text"], "Atom count in all: 7");

    // A's next event is its own ping, not B's response.
    let ping = json!({ "jsonrpc": "2.0", "id": "a-ping", "method": "ping" });
    let response = app.clone().oneshot(post(&endpoint_a, &ping.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let (_, data) = next_event(&mut body_a).await;
    let message: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(message["id"], "a-ping");

    // Nothing of A's leaks onto B.
    assert!(
        tokio::time::timeout(Duration::from_millis(300), body_b.frame())
            .await
            .is_err()
    );
}
