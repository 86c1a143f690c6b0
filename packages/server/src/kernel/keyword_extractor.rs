//! Deterministic keyword-matching extractor.
//!
//! Used in development when no OpenAI key is configured, and as a
//! predictable extractor in tests. Recognises a few well-known companies by
//! name and otherwise returns a fixed placeholder company.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::BaseCompanyExtractor;
use crate::domains::companies::models::{CompanyCandidate, Tier};

/// Keyword extractor with optional simulated latency
#[derive(Debug, Clone, Default)]
pub struct KeywordExtractor {
    latency: Duration,
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering, to mimic a remote call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn candidate_for(text: &str) -> CompanyCandidate {
        let placeholder = CompanyCandidate::named("Dummy Corp")
            .with_industry("Technology")
            .with_location("San Francisco, CA")
            .with_tier(Tier::Tier1)
            .with_description("A dummy company created for testing purposes.")
            .with_contact_info("contact@dummycorp.com");

        let lowered = text.to_lowercase();
        if lowered.contains("google") {
            CompanyCandidate {
                name: "Google".to_string(),
                description: Some(
                    "Tech giant specializing in search and cloud services.".to_string(),
                ),
                ..placeholder
            }
        } else if lowered.contains("microsoft") {
            CompanyCandidate {
                name: "Microsoft".to_string(),
                description: Some("Software and technology company.".to_string()),
                ..placeholder
            }
        } else {
            placeholder
        }
    }
}

#[async_trait]
impl BaseCompanyExtractor for KeywordExtractor {
    async fn extract(&self, text: &str) -> Result<Option<CompanyCandidate>> {
        let preview: String = text.chars().take(50).collect();
        info!(text_preview = %preview, "Keyword extraction started");

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let candidate = Self::candidate_for(text);
        info!(company = %candidate.name, "Keyword extraction finished");
        Ok(Some(candidate))
    }
}
