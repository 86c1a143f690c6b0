// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BaseCompanyExtractor, BaseCompanyStore, ServerDeps, StoreError};
use crate::domains::companies::models::{normalize_name, CompanyCandidate, CompanyRecord};

// =============================================================================
// Mock Extractor
// =============================================================================

#[derive(Debug, Clone)]
enum MockExtraction {
    Candidate(CompanyCandidate),
    Nothing,
    Failure(String),
}

/// Extractor returning queued responses, then a fallback.
///
/// Records every text it was asked to extract from.
pub struct MockCompanyExtractor {
    responses: Arc<Mutex<VecDeque<MockExtraction>>>,
    fallback: Option<CompanyCandidate>,
    latency: Duration,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockCompanyExtractor {
    /// Extractor that finds nothing unless responses are queued
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: None,
            latency: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Extractor that always returns this candidate
    pub fn always(candidate: CompanyCandidate) -> Self {
        Self {
            fallback: Some(candidate),
            ..Self::new()
        }
    }

    /// Queue a candidate to be returned
    pub fn with_candidate(self, candidate: CompanyCandidate) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockExtraction::Candidate(candidate));
        self
    }

    /// Queue an empty result
    pub fn with_nothing(self) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockExtraction::Nothing);
        self
    }

    /// Queue a failure with this message
    pub fn with_failure(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockExtraction::Failure(message.to_string()));
        self
    }

    /// Delay every extraction, to let concurrent sessions interleave
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Get all texts that were submitted
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockCompanyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCompanyExtractor for MockCompanyExtractor {
    async fn extract(&self, text: &str) -> Result<Option<CompanyCandidate>> {
        self.calls.lock().unwrap().push(text.to_string());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockExtraction::Candidate(candidate)) => Ok(Some(candidate)),
            Some(MockExtraction::Nothing) => Ok(None),
            Some(MockExtraction::Failure(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(self.fallback.clone()),
        }
    }
}

// =============================================================================
// In-Memory Company Store
// =============================================================================

/// Company store keyed by normalized name.
///
/// Insert checks and writes under one lock, so it has the same
/// insert-if-absent guarantee as the unique index in Postgres.
pub struct InMemoryCompanyStore {
    records: Mutex<HashMap<String, CompanyRecord>>,
    find_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    stale_lookups: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            find_calls: AtomicUsize::new(0),
            insert_calls: AtomicUsize::new(0),
            stale_lookups: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Seed an existing record without counting it as a call
    pub fn with_record(self, record: CompanyRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(normalize_name(&record.name), record);
        self
    }

    /// Make the next `count` lookups miss, as if another writer had not
    /// committed yet. Simulates losing an insert race.
    pub fn with_stale_lookups(self, count: usize) -> Self {
        self.stale_lookups.store(count, Ordering::SeqCst);
        self
    }

    /// Make every operation fail with this message
    pub fn failing(self, message: &str) -> Self {
        *self.failure.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Total find_by_name + insert calls
    pub fn call_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst) + self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<CompanyRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryCompanyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCompanyStore for InMemoryCompanyStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<CompanyRecord>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let stale = self
            .stale_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(None);
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&normalize_name(name))
            .cloned())
    }

    async fn insert(
        &self,
        candidate: &CompanyCandidate,
        created_by: &str,
    ) -> Result<CompanyRecord, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;

        let key = normalize_name(&candidate.name);
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&key) {
            return Err(StoreError::NameTaken {
                name: candidate.name.trim().to_string(),
            });
        }

        let record = CompanyRecord::from_candidate(candidate, created_by);
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn find_by_creator(&self, created_by: &str) -> Result<Vec<CompanyRecord>, StoreError> {
        self.check_failure()?;

        let mut records: Vec<CompanyRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.created_by == created_by)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_failure()
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of doubles that keeps concrete handles for assertions
pub struct TestDependencies {
    pub extractor: Arc<MockCompanyExtractor>,
    pub store: Arc<InMemoryCompanyStore>,
}

impl TestDependencies {
    pub fn new(extractor: MockCompanyExtractor, store: InMemoryCompanyStore) -> Self {
        Self {
            extractor: Arc::new(extractor),
            store: Arc::new(store),
        }
    }

    /// Extractor that always returns `candidate`, with an empty store
    pub fn extracting(candidate: CompanyCandidate) -> Self {
        Self::new(
            MockCompanyExtractor::always(candidate),
            InMemoryCompanyStore::new(),
        )
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(self.extractor.clone(), self.store.clone())
    }
}
