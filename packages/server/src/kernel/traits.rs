// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "deduplicate a company") lives in domain actions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseCompanyExtractor, BaseCompanyStore)

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::domains::companies::models::{CompanyCandidate, CompanyRecord};

// =============================================================================
// Extraction Trait (Infrastructure - text -> company candidate)
// =============================================================================

#[async_trait]
pub trait BaseCompanyExtractor: Send + Sync {
    /// Extract a company candidate from free-form text.
    ///
    /// Returns Ok(None) when the text does not describe a company. May be slow
    /// (remote LLM call) and may fail.
    async fn extract(&self, text: &str) -> Result<Option<CompanyCandidate>>;
}

// =============================================================================
// Company Store Trait (Infrastructure - persistence + uniqueness)
// =============================================================================

/// Errors surfaced by a company store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another record already holds this case-insensitive name
    #[error("company '{name}' already exists")]
    NameTaken { name: String },

    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Store could not be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait BaseCompanyStore: Send + Sync {
    /// Find a company by case-insensitive exact name. At most one result.
    async fn find_by_name(&self, name: &str) -> Result<Option<CompanyRecord>, StoreError>;

    /// Insert a new company created by `created_by`.
    ///
    /// Atomic insert-if-absent: when a record with the same case-insensitive
    /// name exists (including one inserted concurrently), returns
    /// `StoreError::NameTaken` and writes nothing.
    async fn insert(
        &self,
        candidate: &CompanyCandidate,
        created_by: &str,
    ) -> Result<CompanyRecord, StoreError>;

    /// Companies created by a user, newest first
    async fn find_by_creator(&self, created_by: &str) -> Result<Vec<CompanyRecord>, StoreError>;

    /// Check the store is reachable
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
