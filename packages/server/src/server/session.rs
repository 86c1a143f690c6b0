//! Per-connection worker loop.
//!
//! One `Session` per WebSocket connection. Frames are handled strictly one at
//! a time in arrival order; a `process_text` request runs to completion before
//! the next frame is read. No error from a single frame closes the session.

use std::sync::Arc;

use anyhow::Result;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::common::envelope::{
    InboundEnvelope, OutboundEnvelope, CONNECTED_MESSAGE, INVALID_FORMAT_ERROR, PROCESS_TEXT,
    SERVER_ERROR,
};
use crate::domains::companies::actions::{process_text, ProcessTextRequest};
use crate::kernel::{ServerDeps, SessionHandle, SessionId, SessionRegistry};

pub struct Session {
    handle: SessionHandle,
    registry: SessionRegistry,
    deps: Arc<ServerDeps>,
}

impl Session {
    /// Register a new session and queue the connection confirmation.
    ///
    /// Returns the session and the receiver its writer should drain.
    pub async fn connect(
        registry: &SessionRegistry,
        deps: Arc<ServerDeps>,
    ) -> (Self, mpsc::UnboundedReceiver<OutboundEnvelope>) {
        let (handle, outbound) = registry.register().await;
        let active_sessions = registry.len().await;
        info!(session_id = %handle.id(), active_sessions, "Client connected");

        handle.send(OutboundEnvelope::status(CONNECTED_MESSAGE)).await;

        let session = Self {
            handle,
            registry: registry.clone(),
            deps,
        };
        (session, outbound)
    }

    pub fn id(&self) -> SessionId {
        self.handle.id()
    }

    /// Handle inbound text frames until the stream ends, then disconnect.
    pub async fn run<S>(self, inbound: S)
    where
        S: Stream<Item = String>,
    {
        let mut inbound = std::pin::pin!(inbound);
        while let Some(frame) = inbound.next().await {
            self.handle_frame(&frame).await;
        }
        self.disconnect().await;
    }

    /// Handle one inbound text frame.
    pub async fn handle_frame(&self, frame: &str) {
        let envelope = match InboundEnvelope::parse(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(session_id = %self.id(), error = %e, "Invalid JSON received");
                self.handle
                    .send(OutboundEnvelope::error(INVALID_FORMAT_ERROR))
                    .await;
                return;
            }
        };

        if let Err(e) = self.dispatch(envelope).await {
            error!(session_id = %self.id(), error = %e, "Error handling message");
            self.handle.send(OutboundEnvelope::error(SERVER_ERROR)).await;
        }
    }

    async fn dispatch(&self, envelope: InboundEnvelope) -> Result<()> {
        debug!(
            session_id = %self.id(),
            message_type = ?envelope.message_type,
            "Received message"
        );

        match envelope.message_type.as_deref() {
            Some(PROCESS_TEXT) => {
                let request = ProcessTextRequest::from_data(envelope.data)?;
                process_text(request, &self.deps, &self.handle).await;
            }
            other => {
                // Unknown types are ignored without a reply; clients rely on the silence
                warn!(session_id = %self.id(), message_type = ?other, "Unknown message type");
            }
        }
        Ok(())
    }

    /// Remove the session from the registry. Nothing is sent afterwards.
    pub async fn disconnect(self) {
        self.registry.unregister(self.id()).await;
        let active_sessions = self.registry.len().await;
        info!(session_id = %self.id(), active_sessions, "Client disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::companies::models::{CompanyCandidate, Tier};
    use crate::kernel::TestDependencies;

    async fn connect(deps: &TestDependencies) -> (Session, mpsc::UnboundedReceiver<OutboundEnvelope>) {
        let registry = SessionRegistry::new();
        Session::connect(&registry, Arc::new(deps.server_deps())).await
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<OutboundEnvelope>) -> Vec<OutboundEnvelope> {
        let mut envelopes = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            envelopes.push(envelope);
        }
        envelopes
    }

    #[tokio::test]
    async fn test_connect_sends_status_first() {
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let (_session, mut rx) = connect(&deps).await;

        assert_eq!(drain(&mut rx), vec![OutboundEnvelope::status(CONNECTED_MESSAGE)]);
    }

    #[tokio::test]
    async fn test_malformed_frame_reports_invalid_format() {
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let (session, mut rx) = connect(&deps).await;
        drain(&mut rx);

        session.handle_frame("{not json").await;

        assert_eq!(drain(&mut rx), vec![OutboundEnvelope::error(INVALID_FORMAT_ERROR)]);
    }

    #[tokio::test]
    async fn test_unknown_type_is_silent() {
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let (session, mut rx) = connect(&deps).await;
        drain(&mut rx);

        session.handle_frame(r#"{"type":"ping"}"#).await;
        session.handle_frame(r#"{"data":{"text":"no type"}}"#).await;
        session.handle_frame("42").await;

        assert!(drain(&mut rx).is_empty());
        assert_eq!(deps.extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_data_reports_server_error() {
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let (session, mut rx) = connect(&deps).await;
        drain(&mut rx);

        session
            .handle_frame(r#"{"type":"process_text","data":"not an object"}"#)
            .await;

        assert_eq!(drain(&mut rx), vec![OutboundEnvelope::error(SERVER_ERROR)]);
    }

    #[tokio::test]
    async fn test_process_text_emits_status_then_complete() {
        let deps =
            TestDependencies::extracting(CompanyCandidate::named("Google").with_tier(Tier::Tier1));
        let (session, mut rx) = connect(&deps).await;
        drain(&mut rx);

        session
            .handle_frame(
                r#"{"type":"process_text","data":{"text":"Google is hiring engineers","user_id":"u1"}}"#,
            )
            .await;

        let envelopes = drain(&mut rx);
        assert_eq!(envelopes.len(), 2);
        assert_eq!(
            envelopes[0],
            OutboundEnvelope::status("Extracting company information...")
        );
        match &envelopes[1] {
            OutboundEnvelope::ProcessingComplete {
                success,
                result,
                original_text,
            } => {
                assert!(success);
                assert_eq!(result.company_name, "Google");
                assert_eq!(result.tier, Tier::Tier1);
                assert!(!result.is_duplicate);
                assert_eq!(original_text, "Google is hiring engineers");
            }
            other => panic!("expected processing_complete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_epoch_timestamp_and_non_string_user_id_are_processed() {
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let (session, mut rx) = connect(&deps).await;
        drain(&mut rx);

        session
            .handle_frame(
                r#"{"type":"process_text","data":{"text":"Google is hiring","user_id":true,"timestamp":1700000000000}}"#,
            )
            .await;

        let envelopes = drain(&mut rx);
        assert_eq!(envelopes.len(), 2);
        assert!(matches!(
            envelopes[1],
            OutboundEnvelope::ProcessingComplete { .. }
        ));
        assert_eq!(deps.extractor.call_count(), 1);
        assert_eq!(deps.store.records()[0].created_by, "true");
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_session_futures_are_send() {
        let registry = SessionRegistry::new();
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let server_deps = Arc::new(deps.server_deps());

        // Sessions run inside a spawned WebSocket upgrade task
        assert_send(&Session::connect(&registry, server_deps.clone()));
        let (session, _rx) = Session::connect(&registry, server_deps).await;
        assert_send(&session.handle_frame(r#"{"type":"process_text"}"#));
        assert_send(&session.run(futures::stream::empty::<String>()));
    }

    #[tokio::test]
    async fn test_disconnect_unregisters() {
        let registry = SessionRegistry::new();
        let deps = TestDependencies::extracting(CompanyCandidate::named("Google"));
        let (session, mut rx) = Session::connect(&registry, Arc::new(deps.server_deps())).await;
        assert_eq!(registry.len().await, 1);

        session.run(futures::stream::empty::<String>()).await;

        assert!(registry.is_empty().await);
        assert_eq!(drain(&mut rx), vec![OutboundEnvelope::status(CONNECTED_MESSAGE)]);
    }
}
