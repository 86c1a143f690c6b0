//! Process-wide registry of live WebSocket sessions.
//!
//! Maps each session id to the sender feeding that connection's writer task.
//! Delivery is strictly point-to-point: an envelope goes to exactly one
//! session, never fanned out.
//!
//! # Usage
//!
//! Connection handler:
//!   let (handle, outbound) = registry.register().await;
//!   // spawn a writer draining `outbound` into the socket
//!
//! Domain actions:
//!   handle.send(OutboundEnvelope::status("Working...")).await;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::common::envelope::OutboundEnvelope;

/// Connection-scoped session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ses_{}", self.0.simple())
    }
}

struct SessionEntry {
    sender: mpsc::UnboundedSender<OutboundEnvelope>,
    connected_at: DateTime<Utc>,
}

/// Registry of live sessions.
///
/// Thread-safe, cloneable. Register and unregister may race freely.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session. Returns its handle and the receiving end of
    /// its outbound channel.
    pub async fn register(&self) -> (SessionHandle, mpsc::UnboundedReceiver<OutboundEnvelope>) {
        let id = SessionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();

        self.sessions.write().await.insert(
            id,
            SessionEntry {
                sender,
                connected_at: Utc::now(),
            },
        );

        let handle = SessionHandle {
            id,
            registry: self.clone(),
        };
        (handle, receiver)
    }

    /// Remove a session. Returns false if it was already gone.
    ///
    /// Dropping the entry closes the outbound channel once queued envelopes
    /// are drained.
    pub async fn unregister(&self, id: SessionId) -> bool {
        match self.sessions.write().await.remove(&id) {
            Some(entry) => {
                let duration = Utc::now() - entry.connected_at;
                tracing::debug!(
                    session_id = %id,
                    connected_secs = duration.num_seconds(),
                    "Session unregistered"
                );
                true
            }
            None => false,
        }
    }

    /// Queue an envelope for one session.
    ///
    /// Returns false (and drops the envelope) if the session is gone or its
    /// writer has shut down.
    pub async fn deliver(&self, id: SessionId, envelope: OutboundEnvelope) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some(entry) => entry.sender.send(envelope).is_ok(),
            None => {
                tracing::debug!(session_id = %id, "Dropping envelope for disconnected session");
                false
            }
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Send capability for a single session.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    registry: SessionRegistry,
}

impl SessionHandle {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Send an envelope to this session. Returns false if it was discarded.
    pub async fn send(&self, envelope: OutboundEnvelope) -> bool {
        self.registry.deliver(self.id, envelope).await
    }
}
