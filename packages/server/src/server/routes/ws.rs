//! WebSocket endpoint.
//!
//! GET /ws
//!
//! Upgrades the connection and hands it to a `Session`. The socket is split:
//! the session loop consumes inbound text frames in order, and a writer task
//! drains the session's outbound channel into the socket, one JSON object
//! per text frame.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension,
    },
    response::Response,
};
use futures::{future, SinkExt, StreamExt};

use crate::server::app::AppState;
use crate::server::session::Session;

pub async fn ws_handler(ws: WebSocketUpgrade, Extension(state): Extension<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, stream) = socket.split();
    let (session, mut outbound) =
        Session::connect(&state.sessions, state.server_deps.clone()).await;
    let session_id = session.id();

    let writer = tokio::spawn(async move {
        while let Some(envelope) = outbound.recv().await {
            let payload = match serde_json::to_string(&envelope) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(session_id = %session_id, error = %e, "Failed to serialize envelope");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(payload)).await {
                tracing::debug!(session_id = %session_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Text frames until close or transport error; binary frames are ignored
    // and ping/pong is answered by axum.
    let inbound = stream
        .take_while(move |message| {
            let open = match message {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(session_id = %session_id, error = %e, "WebSocket receive failed");
                    false
                }
            };
            future::ready(open)
        })
        .filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(text),
                _ => None,
            })
        });

    session.run(inbound).await;
    writer.abort();
}
