//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by the
//! WebSocket sessions. External services sit behind trait objects so tests
//! can swap in the doubles from `test_dependencies`.

use std::sync::Arc;

use crate::kernel::{BaseCompanyExtractor, BaseCompanyStore};

/// Server dependencies accessible to domain actions
#[derive(Clone)]
pub struct ServerDeps {
    /// Turns submitted text into a company candidate. The workflow does not
    /// know whether this is the OpenAI extractor or a deterministic double.
    pub extractor: Arc<dyn BaseCompanyExtractor>,
    /// Authoritative company store; owns name uniqueness
    pub store: Arc<dyn BaseCompanyStore>,
}

impl ServerDeps {
    pub fn new(
        extractor: Arc<dyn BaseCompanyExtractor>,
        store: Arc<dyn BaseCompanyStore>,
    ) -> Self {
        Self { extractor, store }
    }
}
