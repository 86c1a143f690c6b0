//! Companies domain actions - business logic functions
//!
//! Actions are async functions called directly from the WebSocket session.
//! They do the work and report through the session handle.

mod process_company;
mod process_text;

pub use process_company::{process_company, WorkflowResult};
pub use process_text::{process_text, ProcessTextRequest};
