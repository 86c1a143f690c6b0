// Company Intake - Server Core
//
// Real-time company ingestion over WebSocket: clients submit free text, the
// server extracts a company, deduplicates it by name, stores it, and streams
// progress back to the submitting session.
//
// Workflow actions are organized per-domain in domains/*/actions/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
