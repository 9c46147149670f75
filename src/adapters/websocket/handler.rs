//! WebSocket upgrade handler for live bus tracking.
//!
//! Handles the HTTP → WebSocket upgrade and drives one session:
//! 1. Verify the bearer credential (header or `?token=`) and register
//! 2. Upgrade to WebSocket
//! 3. Forward the session's outbox to the socket
//! 4. Decode client frames and dispatch them until disconnect
//! 5. Purge the session

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;

use crate::application::tracking::{Connection, ConnectionLifecycle};
use crate::domain::foundation::{ErrorCode, SessionId, ValidationError};
use crate::domain::tracking::TrackingError;

use super::messages::{ClientMessage, ErrorMessage, ServerMessage};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub lifecycle: Arc<ConnectionLifecycle>,
}

impl WebSocketState {
    pub fn new(lifecycle: Arc<ConnectionLifecycle>) -> Self {
        Self { lifecycle }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
}

/// Pull the bearer credential from the `Authorization` header, falling
/// back to the `token` query parameter browsers must use.
fn credential<'a>(headers: &'a HeaderMap, params: &'a ConnectParams) -> Option<&'a str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or(params.token.as_deref())
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
///
/// The credential is checked before the upgrade so a rejected client gets
/// a plain 401 and no session is ever registered.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(params): Query<ConnectParams>,
    State(state): State<WebSocketState>,
) -> Response {
    let connection = match state
        .lifecycle
        .on_connect(credential(&headers, &params))
        .await
    {
        Ok(connection) => connection,
        Err(e) => {
            let body = ErrorMessage {
                code: ErrorCode::Unauthorized.to_string(),
                message: e.to_string(),
            };
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }
    };

    let session_id = connection.session.id;
    let on_failure = state.lifecycle.clone();
    let lifecycle = state.lifecycle;

    ws.on_failed_upgrade(move |e| {
        tracing::debug!(session_id = %session_id, "WebSocket upgrade failed: {}", e);
        tokio::spawn(async move { on_failure.on_disconnect(&session_id).await });
    })
    .on_upgrade(move |socket| handle_socket(socket, connection, lifecycle))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection. Whichever half finishes first
/// (client hung up, or the outbox closed at shutdown) ends both.
async fn handle_socket(socket: WebSocket, connection: Connection, lifecycle: Arc<ConnectionLifecycle>) {
    let Connection { session, mut inbox } = connection;
    let session_id = session.id;
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let msg = ServerMessage::from(event);
            if let Err(e) = send_message(&mut sender, &msg).await {
                tracing::debug!(session_id = %session_id, "Send error, closing connection: {}", e);
                break;
            }
        }
        let _ = sender.close().await;
    });

    let recv_lifecycle = lifecycle.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    handle_text(&recv_lifecycle, &session_id, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(session_id = %session_id, "Received unsupported binary message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // protocol-level, answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(session_id = %session_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %session_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    lifecycle.on_disconnect(&session_id).await;
}

async fn handle_text(lifecycle: &ConnectionLifecycle, session_id: &SessionId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => lifecycle.dispatch(session_id, msg.into_command()).await,
        Err(e) => {
            let error = TrackingError::Validation(ValidationError::invalid_format(
                "message",
                e.to_string(),
            ));
            lifecycle.reject(session_id, &error).await;
        }
    }
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_credential_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        let params = ConnectParams {
            token: Some("query-token".to_string()),
        };

        assert_eq!(credential(&headers, &params), Some("header-token"));
    }

    #[test]
    fn query_credential_used_without_header() {
        let params = ConnectParams {
            token: Some("query-token".to_string()),
        };

        assert_eq!(credential(&HeaderMap::new(), &params), Some("query-token"));
    }

    #[test]
    fn non_bearer_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        assert_eq!(credential(&headers, &ConnectParams::default()), None);
    }

    #[test]
    fn websocket_router_creates_route() {
        let _router = websocket_router();
    }
}
