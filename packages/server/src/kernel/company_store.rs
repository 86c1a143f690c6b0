//! PostgreSQL implementation of BaseCompanyStore.
//!
//! Uniqueness is enforced by the `companies_name_lower_idx` unique index, so
//! two sessions inserting the same name at the same time cannot both succeed.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{BaseCompanyStore, StoreError};
use crate::domains::companies::models::{CompanyCandidate, CompanyRecord};

/// Company store backed by the `companies` table
#[derive(Clone)]
pub struct PostgresCompanyStore {
    pool: PgPool,
}

impl PostgresCompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseCompanyStore for PostgresCompanyStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<CompanyRecord>, StoreError> {
        Ok(CompanyRecord::find_by_name(name, &self.pool).await?)
    }

    async fn insert(
        &self,
        candidate: &CompanyCandidate,
        created_by: &str,
    ) -> Result<CompanyRecord, StoreError> {
        let record = CompanyRecord::from_candidate(candidate, created_by);

        match record.insert_if_absent(&self.pool).await? {
            Some(inserted) => Ok(inserted),
            None => {
                debug!(name = %record.name, "Insert skipped by unique name index");
                Err(StoreError::NameTaken { name: record.name })
            }
        }
    }

    async fn find_by_creator(&self, created_by: &str) -> Result<Vec<CompanyRecord>, StoreError> {
        Ok(CompanyRecord::find_by_creator(created_by, &self.pool).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
