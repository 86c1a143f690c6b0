// JSON envelopes exchanged over the intake WebSocket
//
// Every frame carries exactly one JSON object with a `type` tag.
// These types are shared between the server (framing) and domain actions
// (which emit status/result envelopes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use crate::domains::companies::models::Tier;

/// Inbound message type for text-processing requests
pub const PROCESS_TEXT: &str = "process_text";

pub const CONNECTED_MESSAGE: &str = "Connected to server successfully";
pub const EXTRACTING_MESSAGE: &str = "Extracting company information...";
pub const INVALID_FORMAT_ERROR: &str = "Invalid message format";
pub const SERVER_ERROR: &str = "Server error occurred";
pub const NO_TEXT_ERROR: &str = "No text provided";
pub const USER_ID_REQUIRED_ERROR: &str = "User ID required";
pub const NO_COMPANY_ERROR: &str = "Could not extract company information from text";

/// Inbound frame could not be decoded
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decoded inbound frame: `{"type": "...", "data": {...}}`.
///
/// `message_type` stays a plain string so unrecognised tags can be ignored
/// instead of rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    pub message_type: Option<String>,
    pub data: JsonValue,
}

impl InboundEnvelope {
    /// Decode a text frame. Only invalid JSON is an error; a JSON value with
    /// no string `type` decodes with `message_type: None`.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let value: JsonValue = serde_json::from_str(frame)?;

        let message_type = value
            .get("type")
            .and_then(JsonValue::as_str)
            .map(str::to_string);
        let data = value.get("data").cloned().unwrap_or(JsonValue::Null);

        Ok(Self { message_type, data })
    }
}

/// Result block of a `processing_complete` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub company_id: Uuid,
    pub company_name: String,
    pub tier: Tier,
    pub is_duplicate: bool,
    pub created_at: DateTime<Utc>,
}

/// Outbound frame, serialized with its `type` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEnvelope {
    Status {
        message: String,
    },
    ProcessingComplete {
        success: bool,
        result: ProcessingResult,
        #[serde(rename = "originalText")]
        original_text: String,
    },
    ProcessingError {
        error: String,
    },
}

impl OutboundEnvelope {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::ProcessingError {
            error: error.into(),
        }
    }

    pub fn complete(result: ProcessingResult, original_text: impl Into<String>) -> Self {
        Self::ProcessingComplete {
            success: true,
            result,
            original_text: original_text.into(),
        }
    }

    /// Whether this envelope ends a `process_text` exchange
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ProcessingComplete { .. } | Self::ProcessingError { .. }
        )
    }
}
