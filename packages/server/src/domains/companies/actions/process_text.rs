//! `process_text` handler: extract, deduplicate, persist, report.
//!
//! Each step's envelope is sent to the owning session before the next step
//! starts, so the client always sees `status` before the terminal
//! `processing_complete` or `processing_error`.

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use super::process_company;
use crate::common::envelope::{
    OutboundEnvelope, ProcessingResult, EXTRACTING_MESSAGE, NO_COMPANY_ERROR, NO_TEXT_ERROR,
    USER_ID_REQUIRED_ERROR,
};
use crate::kernel::{ServerDeps, SessionHandle};

/// `data` payload of a `process_text` envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessTextRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Opaque user identifier; any non-empty JSON value is accepted
    #[serde(default)]
    pub user_id: Option<JsonValue>,
    /// Client-side timestamp, informational only. Clients send ISO strings or
    /// epoch numbers, so it is kept untyped.
    #[serde(default)]
    pub timestamp: Option<JsonValue>,
}

impl ProcessTextRequest {
    /// Decode from an envelope's `data`. Missing or null data is an empty request.
    pub fn from_data(data: JsonValue) -> Result<Self> {
        if data.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(data)?)
    }

    /// Submitted text with surrounding whitespace removed
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().unwrap_or_default().trim()
    }

    /// The user id as stored in `created_by`, or None if absent or empty.
    ///
    /// Strings are stored verbatim, any other value as its JSON text.
    /// `null`, `false`, `""`, `0`, `[]` and `{}` count as missing.
    pub fn user_id(&self) -> Option<String> {
        match self.user_id.as_ref()? {
            JsonValue::Null | JsonValue::Bool(false) => None,
            JsonValue::String(s) if s.is_empty() => None,
            JsonValue::Number(n) if n.as_f64() == Some(0.0) => None,
            JsonValue::Array(items) if items.is_empty() => None,
            JsonValue::Object(fields) if fields.is_empty() => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Run the company workflow for one request, reporting to `session`.
///
/// Never fails: validation problems and dependency errors are reported to the
/// client as `processing_error` envelopes.
pub async fn process_text(request: ProcessTextRequest, deps: &ServerDeps, session: &SessionHandle) {
    let text = request.trimmed_text();
    if text.is_empty() {
        session.send(OutboundEnvelope::error(NO_TEXT_ERROR)).await;
        return;
    }

    let Some(user_id) = request.user_id() else {
        session.send(OutboundEnvelope::error(USER_ID_REQUIRED_ERROR)).await;
        return;
    };

    session
        .send(OutboundEnvelope::status(EXTRACTING_MESSAGE))
        .await;

    if let Err(e) = extract_and_store(text, &user_id, deps, session).await {
        error!(session_id = %session.id(), error = %format!("{:#}", e), "Error processing text");
        session
            .send(OutboundEnvelope::error(format!("Processing failed: {:#}", e)))
            .await;
    }
}

async fn extract_and_store(
    text: &str,
    user_id: &str,
    deps: &ServerDeps,
    session: &SessionHandle,
) -> Result<()> {
    let candidate = match deps.extractor.extract(text).await? {
        Some(candidate) if candidate.has_name() => candidate,
        _ => {
            warn!(session_id = %session.id(), "Extractor found no company");
            session.send(OutboundEnvelope::error(NO_COMPANY_ERROR)).await;
            return Ok(());
        }
    };

    let result = process_company(&candidate, user_id, deps.store.as_ref()).await?;

    let delivered = session
        .send(OutboundEnvelope::complete(
            ProcessingResult {
                company_id: result.company_id,
                company_name: candidate.name.clone(),
                tier: candidate.tier,
                is_duplicate: result.is_duplicate,
                created_at: Utc::now(),
            },
            text,
        ))
        .await;

    info!(
        session_id = %session.id(),
        company = %candidate.name,
        is_duplicate = result.is_duplicate,
        delivered,
        "{}",
        result.message
    );
    Ok(())
}
