//! HTTP+SSE binding.
//!
//! `GET /sse` opens a session and announces where to POST with an `endpoint`
//! event. Each `POST /messages/?session_id=…` is acknowledged with 202 right
//! away; the JSON-RPC response, if any, is pushed onto the session's stream
//! as a `message` event.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::state::AppState;

pub const MESSAGES_PATH: &str = "/messages/";
const SESSION_BUFFER: usize = 64;

// ── Session registry ────────────────────────────────────────────────────────

/// Live SSE sessions keyed by id. An entry exists exactly as long as its
/// event stream.
#[derive(Default)]
pub struct SseSessions {
    senders: Mutex<HashMap<Uuid, mpsc::Sender<Event>>>,
}

impl SseSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self) -> (Uuid, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        let id = Uuid::new_v4();
        self.senders
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id, tx);
        (id, rx)
    }

    fn sender(&self, id: &Uuid) -> Option<mpsc::Sender<Event>> {
        self.senders
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .cloned()
    }

    fn close(&self, id: &Uuid) {
        self.senders
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(id);
    }

    pub fn len(&self) -> usize {
        self.senders.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes its session when the event stream is dropped.
struct SessionGuard {
    sessions: Arc<SseSessions>,
    id: Uuid,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.close(&self.id);
        tracing::info!(session = %self.id.simple(), "MCP: SSE session closed");
    }
}

// ── Handler: GET /sse ───────────────────────────────────────────────────────

pub async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<Event, Infallible>>> {
    let (id, rx) = state.sessions.open();
    let endpoint = format!("{}?session_id={}", MESSAGES_PATH, id.simple());
    tracing::info!(session = %id.simple(), "MCP: SSE session opened");

    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id,
    };
    let announce = futures_util::stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    });
    let messages = ReceiverStream::new(rx).map(move |event| {
        let _ = &guard;
        Ok::<_, Infallible>(event)
    });

    Sse::new(announce.chain(messages)).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

// ── Handler: POST /messages/ ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    session_id: Option<String>,
}

pub async fn messages_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(raw_id) = query.session_id.filter(|s| !s.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };
    let Ok(id) = Uuid::try_parse(&raw_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
    };
    let Some(tx) = state.sessions.sender(&id) else {
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(session = %id.simple(), "MCP: unparsable message: {}", e);
            return (StatusCode::BAD_REQUEST, "Could not parse message").into_response();
        }
    };

    let server = state.mcp.clone();
    tokio::spawn(async move {
        let Some(response) = server.handle_message(message).await else {
            return;
        };
        let event = Event::default().event("message").data(response.to_string());
        if tx.send(event).await.is_err() {
            tracing::debug!(session = %id.simple(), "MCP: session gone before response was sent");
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_open_lookup_close() {
        let sessions = Arc::new(SseSessions::new());
        let (id, _rx) = sessions.open();
        assert!(sessions.sender(&id).is_some());
        assert_eq!(sessions.len(), 1);

        drop(SessionGuard {
            sessions: sessions.clone(),
            id,
        });
        assert!(sessions.sender(&id).is_none());
        assert!(sessions.is_empty());
    }

    #[test]
    fn session_ids_are_distinct() {
        let sessions = SseSessions::new();
        let (a, _ra) = sessions.open();
        let (b, _rb) = sessions.open();
        assert_ne!(a, b);
    }
}
