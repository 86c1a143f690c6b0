// Companies domain - turns submitted text into deduplicated company records
//
// Responsibilities:
// - Extraction of a company candidate from free-form text (via BaseCompanyExtractor)
// - Case-insensitive name deduplication against stored companies
// - Reporting status/result envelopes to the submitting session

pub mod actions;
pub mod models;

pub use models::*;
