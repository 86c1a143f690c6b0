//! In-process server and WebSocket client for end-to-end tests.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value as JsonValue;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use intake_core::common::OutboundEnvelope;
use intake_core::kernel::{ServerDeps, TestDependencies};
use intake_core::server::{build_app, AppState};

/// How long a client waits for a frame before the test fails
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// The app bound to an ephemeral localhost port
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(deps: &TestDependencies) -> Self {
        Self::serve(deps.server_deps()).await
    }

    pub async fn serve(server_deps: ServerDeps) -> Self {
        super::init_tracing();

        let state = AppState::new(server_deps);
        let app = build_app(state.clone(), &[]);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self { addr, state, task }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn connect(&self) -> WsClient {
        let (stream, _) = connect_async(self.ws_url())
            .await
            .expect("WebSocket handshake failed");
        WsClient { stream }
    }

    /// Wait until the registry holds exactly `count` sessions.
    pub async fn wait_for_sessions(&self, count: usize) {
        for _ in 0..100 {
            if self.state.sessions.len().await == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} sessions, registry has {}",
            count,
            self.state.sessions.len().await
        );
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn send_json(&mut self, value: JsonValue) {
        self.send_raw(&value.to_string()).await;
    }

    pub async fn send_raw(&mut self, frame: &str) {
        self.stream
            .send(Message::Text(frame.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Submit text for processing as the given user
    pub async fn process_text(&mut self, text: &str, user_id: &str) {
        self.send_json(serde_json::json!({
            "type": "process_text",
            "data": {
                "text": text,
                "user_id": user_id,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }))
        .await;
    }

    /// Next envelope from the server, skipping control frames
    pub async fn recv(&mut self) -> OutboundEnvelope {
        serde_json::from_value(self.recv_json().await).expect("Server sent an invalid envelope")
    }

    /// Next text frame as raw JSON
    pub async fn recv_json(&mut self) -> JsonValue {
        loop {
            let message = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Connection closed")
                .expect("WebSocket error");

            if let Message::Text(text) = message {
                return serde_json::from_str(&text).expect("Server sent invalid JSON");
            }
        }
    }

    /// Envelopes up to and including the next terminal one
    pub async fn recv_until_terminal(&mut self) -> Vec<OutboundEnvelope> {
        let mut envelopes = Vec::new();
        loop {
            let envelope = self.recv().await;
            let terminal = envelope.is_terminal();
            envelopes.push(envelope);
            if terminal {
                return envelopes;
            }
        }
    }

    /// Assert nothing arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(Message::Text(text)))) =
            tokio::time::timeout(window, self.stream.next()).await
        {
            panic!("expected no frame, got {}", text);
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
