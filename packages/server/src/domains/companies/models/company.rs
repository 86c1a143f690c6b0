use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Company classification label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Tier1,
    Tier2,
    #[default]
    Tier3,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tier1 => "tier1",
            Self::Tier2 => "tier2",
            Self::Tier3 => "tier3",
        }
    }

    /// Parse a tier label, case-insensitively. Returns None for unknown labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "tier1" => Some(Self::Tier1),
            "tier2" => Some(Self::Tier2),
            "tier3" => Some(Self::Tier3),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison key for company names: trimmed and lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Company fields produced by an extractor. Never persisted directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyCandidate {
    pub name: String,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<String>,
}

impl CompanyCandidate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_contact_info(mut self, contact_info: impl Into<String>) -> Self {
        self.contact_info = Some(contact_info.into());
        self
    }

    /// A candidate is usable only if it carries a non-blank name.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// Persisted company. Created once per case-insensitive name, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub tier: String, // 'tier1' | 'tier2' | 'tier3'
    pub location: Option<String>,
    pub funding_stage: Option<String>,
    pub employee_count: Option<String>,
    pub revenue: Option<String>,
    pub contact_info: Option<String>,
    pub extracted_data: Option<JsonValue>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl CompanyRecord {
    /// Build a record for a candidate, assigning a fresh id and timestamp.
    pub fn from_candidate(candidate: &CompanyCandidate, created_by: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: candidate.name.trim().to_string(),
            description: candidate.description.clone(),
            website: candidate.website.clone(),
            industry: candidate.industry.clone(),
            tier: candidate.tier.as_str().to_string(),
            location: candidate.location.clone(),
            funding_stage: candidate.funding_stage.clone(),
            employee_count: candidate.employee_count.clone(),
            revenue: candidate.revenue.clone(),
            contact_info: candidate.contact_info.clone(),
            extracted_data: serde_json::to_value(candidate).ok(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn tier(&self) -> Tier {
        Tier::from_label(&self.tier).unwrap_or_default()
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl CompanyRecord {
    /// Find company by name (case-insensitive exact match)
    pub async fn find_by_name(name: &str, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, CompanyRecord>(
            "SELECT * FROM companies WHERE LOWER(name) = LOWER($1) LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(pool)
        .await
    }

    /// Insert unless a company with the same case-insensitive name exists.
    ///
    /// Returns None when the unique name index rejected the row, which is how
    /// a concurrent insert of the same name shows up.
    pub async fn insert_if_absent(&self, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, CompanyRecord>(
            r#"
            INSERT INTO companies (
                id, name, description, website, industry, tier, location,
                funding_stage, employee_count, revenue, contact_info,
                extracted_data, created_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT ((LOWER(name))) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.website)
        .bind(&self.industry)
        .bind(&self.tier)
        .bind(&self.location)
        .bind(&self.funding_stage)
        .bind(&self.employee_count)
        .bind(&self.revenue)
        .bind(&self.contact_info)
        .bind(&self.extracted_data)
        .bind(&self.created_by)
        .bind(self.created_at)
        .fetch_optional(pool)
        .await
    }

    /// Companies created by a user, newest first
    pub async fn find_by_creator(created_by: &str, pool: &PgPool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, CompanyRecord>(
            r#"
            SELECT * FROM companies
            WHERE created_by = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(created_by)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_serializes_as_lowercase_label() {
        assert_eq!(serde_json::to_value(Tier::Tier1).unwrap(), "tier1");
        assert_eq!(serde_json::to_value(Tier::Tier3).unwrap(), "tier3");
    }

    #[test]
    fn test_tier_from_label_is_case_insensitive() {
        assert_eq!(Tier::from_label("TIER2"), Some(Tier::Tier2));
        assert_eq!(Tier::from_label(" tier1 "), Some(Tier::Tier1));
        assert_eq!(Tier::from_label("gold"), None);
    }

    #[test]
    fn test_candidate_tier_defaults_to_tier3() {
        let candidate: CompanyCandidate =
            serde_json::from_value(serde_json::json!({"name": "Acme Corp"})).unwrap();
        assert_eq!(candidate.tier, Tier::Tier3);
        assert!(candidate.has_name());
    }

    #[test]
    fn test_blank_name_is_not_usable() {
        assert!(!CompanyCandidate::named("   ").has_name());
        assert!(!CompanyCandidate::default().has_name());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  ACME Corp "), "acme corp");
        assert_eq!(normalize_name("Acme Corp"), normalize_name("acme corp"));
    }

    #[test]
    fn test_record_from_candidate_keeps_fields() {
        let candidate = CompanyCandidate::named(" Google ")
            .with_tier(Tier::Tier1)
            .with_description("Search");
        let record = CompanyRecord::from_candidate(&candidate, "user-42");

        assert_eq!(record.name, "Google");
        assert_eq!(record.tier(), Tier::Tier1);
        assert_eq!(record.description.as_deref(), Some("Search"));
        assert_eq!(record.created_by, "user-42");
        assert_eq!(
            record.extracted_data.as_ref().and_then(|d| d.get("name")),
            Some(&serde_json::json!(" Google "))
        );
    }
}
