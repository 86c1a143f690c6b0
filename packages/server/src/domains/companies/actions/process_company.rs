//! Deduplicate a candidate against the store and persist it if new.

use anyhow::{anyhow, bail, Result};
use tracing::info;
use uuid::Uuid;

use crate::domains::companies::models::CompanyCandidate;
use crate::kernel::{BaseCompanyStore, StoreError};

/// Outcome of processing one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowResult {
    pub company_id: Uuid,
    pub is_duplicate: bool,
    pub message: String,
}

impl WorkflowResult {
    fn duplicate(company_id: Uuid, name: &str) -> Self {
        Self {
            company_id,
            is_duplicate: true,
            message: format!("Company '{}' already exists in database", name),
        }
    }

    fn created(company_id: Uuid, name: &str) -> Self {
        Self {
            company_id,
            is_duplicate: false,
            message: format!("Successfully added new company '{}'", name),
        }
    }
}

/// Reuse the stored company with the candidate's name, or insert a new one.
///
/// An insert rejected because a concurrent writer stored the same name first
/// is reported as a duplicate of that record, not as an error.
pub async fn process_company(
    candidate: &CompanyCandidate,
    user_id: &str,
    store: &dyn BaseCompanyStore,
) -> Result<WorkflowResult> {
    let name = candidate.name.trim();
    if name.is_empty() {
        bail!("Company name is required");
    }

    if let Some(existing) = store.find_by_name(name).await? {
        info!(company = %name, company_id = %existing.id, "Company already exists");
        return Ok(WorkflowResult::duplicate(existing.id, name));
    }

    match store.insert(candidate, user_id).await {
        Ok(record) => {
            info!(company = %name, company_id = %record.id, "Created new company");
            Ok(WorkflowResult::created(record.id, name))
        }
        Err(StoreError::NameTaken { .. }) => {
            let existing = store.find_by_name(name).await?.ok_or_else(|| {
                anyhow!("Company '{}' was reported as existing but could not be found", name)
            })?;
            info!(
                company = %name,
                company_id = %existing.id,
                "Lost insert race, reusing existing company"
            );
            Ok(WorkflowResult::duplicate(existing.id, name))
        }
        Err(e) => Err(e.into()),
    }
}
