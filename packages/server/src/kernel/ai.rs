// Company extraction using OpenAI structured outputs
//
// This is the infrastructure implementation of BaseCompanyExtractor.
// The workflow that decides what to do with a candidate lives in the companies domain.

use anyhow::{Context, Result};
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::BaseCompanyExtractor;
use crate::domains::companies::models::{CompanyCandidate, Tier};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const EXTRACTION_PROMPT: &str = "You extract company information from short notes. \
Identify the single company the text is about. Use null for any field the text does not support. \
Set name to null if the text does not mention a company. \
tier is one of tier1 (large, well-known), tier2 (established mid-size) or tier3 (small or unknown).";

/// Shape the model is asked to return
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ExtractedCompany {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub tier: Option<String>,
    pub description: Option<String>,
    pub contact_info: Option<String>,
    pub website: Option<String>,
    pub funding_stage: Option<String>,
    pub employee_count: Option<String>,
    pub revenue: Option<String>,
}

impl ExtractedCompany {
    /// Convert to a candidate. No name means no company was found.
    pub fn into_candidate(self) -> Option<CompanyCandidate> {
        let name = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
        let tier = self
            .tier
            .as_deref()
            .and_then(Tier::from_label)
            .unwrap_or_default();

        Some(CompanyCandidate {
            name,
            tier,
            industry: self.industry,
            location: self.location,
            description: self.description,
            contact_info: self.contact_info,
            website: self.website,
            funding_stage: self.funding_stage,
            employee_count: self.employee_count,
            revenue: self.revenue,
        })
    }
}

/// Generate an OpenAI strict-mode JSON schema for `T`.
///
/// Strict mode needs `additionalProperties: false` on every object and every
/// property listed in `required`, nullable ones included.
pub fn strict_schema<T: JsonSchema>() -> serde_json::Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_default();
    close_objects(&mut value);

    if let serde_json::Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("definitions");
        map.remove("title");
    }
    value
}

fn close_objects(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if map.get("type") == Some(&serde_json::Value::String("object".to_string())) {
                map.insert(
                    "additionalProperties".to_string(),
                    serde_json::Value::Bool(false),
                );
                if let Some(serde_json::Value::Object(props)) = map.get("properties") {
                    let keys = props
                        .keys()
                        .map(|k| serde_json::Value::String(k.clone()))
                        .collect();
                    map.insert("required".to_string(), serde_json::Value::Array(keys));
                }
            }
            for (_, nested) in map.iter_mut() {
                close_objects(nested);
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(close_objects),
        _ => {}
    }
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct StructuredRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// OpenAI implementation of company extraction
#[derive(Clone)]
pub struct OpenAIExtractor {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, text: &str) -> StructuredRequest {
        StructuredRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: EXTRACTION_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: text.to_string(),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "company_extraction",
                    strict: true,
                    schema: strict_schema::<ExtractedCompany>(),
                },
            },
        }
    }
}

#[async_trait]
impl BaseCompanyExtractor for OpenAIExtractor {
    async fn extract(&self, text: &str) -> Result<Option<CompanyCandidate>> {
        tracing::info!(
            model = %self.model,
            text_length = text.len(),
            "Calling OpenAI for company extraction"
        );

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(text))
            .send()
            .await
            .context("Failed to send extraction request to OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "OpenAI extraction failed");
            anyhow::bail!("OpenAI returned {}: {}", status, error_text);
        }

        let chat: ChatResponseRaw = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("OpenAI response contained no content")?;

        let extracted: ExtractedCompany = serde_json::from_str(&content)
            .context("OpenAI returned malformed company JSON")?;

        let candidate = extracted.into_candidate();
        tracing::info!(
            company = candidate.as_ref().map(|c| c.name.as_str()).unwrap_or("<none>"),
            "OpenAI extraction finished"
        );
        Ok(candidate)
    }
}
