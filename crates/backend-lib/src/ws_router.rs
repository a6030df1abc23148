// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
use crate::auth::strip_bearer;
use crate::coordinator::SocketHandler;
use crate::messages::{ClientMessage, InvalidationReason, ServerMessage};
use crate::storage::Storage;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Inbound event names the coordinator understands. Anything else is
/// ignored (logged), per the failure contract.
const KNOWN_EVENTS: [&str; 6] = [
    "join_room",
    "send_message",
    "audio_chunk",
    "request_tts",
    "update_language",
    "leave_room",
];

/// Create the WebSocket router
pub fn create_router<S: Storage + Send + Sync + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// Handler for WebSocket connections
pub async fn ws_handler<S: Storage + Send + Sync + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    counter!(crate::metrics::WS_CONNECTION).increment(1);
    gauge!(crate::metrics::WS_ACTIVE).increment(1.0);

    // The handshake carries the bearer token independently of the HTTP
    // surface: Authorization header or `token` query parameter.
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(|h| strip_bearer(h).to_string())
        .or_else(|| query.get("token").cloned());

    ws.on_upgrade(move |socket| handle_connection(socket, state, bearer))
}

async fn handle_connection<S: Storage + Send + Sync + 'static>(
    socket: WebSocket,
    state: Arc<AppState<S>>,
    bearer: Option<String>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Channel feeding this client's WebSocket
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(32);

    let mut handler = SocketHandler::new(state, client_tx.clone(), bearer);

    // Forward outbound events to the WebSocket as JSON text frames
    let send_task = tokio::spawn(async move {
        while let Some(server_msg) = client_rx.recv().await {
            let json = serde_json::to_string(&server_msg).unwrap_or_default();
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Main task: process incoming WebSocket messages
    while let Some(Ok(message)) = ws_rx.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    if let Err(e) = handler.handle_event(client_msg).await {
                        tracing::debug!(socket_id = %handler.socket_id(), error = %e, "event failed");
                        let _ = client_tx
                            .send(ServerMessage::Error {
                                message: e.to_string(),
                            })
                            .await;
                    }
                }
                Err(_) => {
                    if let Some(reply) = classify_unparseable(&text) {
                        let _ = client_tx.send(reply).await;
                    }
                }
            },
            Message::Close(_) => break,
            _ => {} // Ignore binary/ping/pong frames
        }
    }

    // Cleanup: the disconnect path runs to completion even on abrupt drops
    if let Err(e) = handler
        .handle_leave(InvalidationReason::ParticipantDisconnected)
        .await
    {
        tracing::warn!(error = %e, "disconnect cleanup failed");
    }

    counter!(crate::metrics::WS_DISCONNECTION).increment(1);
    gauge!(crate::metrics::WS_ACTIVE).decrement(1.0);

    send_task.abort();
}

/// Decide what to do with a frame that did not parse as a client event:
/// a malformed payload for a known event type earns an `error` reply, an
/// unrecognised event type is ignored and logged.
fn classify_unparseable(text: &str) -> Option<ServerMessage> {
    let event_type = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| {
            value
                .get("type")
                .and_then(|t| t.as_str())
                .map(ToString::to_string)
        });

    match event_type {
        Some(event) if KNOWN_EVENTS.contains(&event.as_str()) => Some(ServerMessage::Error {
            message: format!("Invalid argument: malformed {event} payload"),
        }),
        Some(event) => {
            tracing::warn!(%event, "ignoring unrecognised event");
            None
        }
        None => Some(ServerMessage::Error {
            message: "Invalid argument: message is not a valid event".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_known_event_gets_an_error_reply() {
        let reply = classify_unparseable(r#"{"type":"send_message","payload":{"content":5}}"#);
        match reply {
            Some(ServerMessage::Error { message }) => {
                assert!(message.contains("send_message"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[test]
    fn unrecognised_event_is_ignored() {
        assert!(classify_unparseable(r#"{"type":"dance","payload":{}}"#).is_none());
    }

    #[test]
    fn non_json_gets_an_error_reply() {
        assert!(classify_unparseable("not json at all").is_some());
    }
}
