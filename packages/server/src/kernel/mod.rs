//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod company_store;
pub mod deps;
pub mod keyword_extractor;
pub mod session_registry;
pub mod test_dependencies;
pub mod traits;

pub use ai::OpenAIExtractor;
pub use company_store::PostgresCompanyStore;
pub use deps::ServerDeps;
pub use keyword_extractor::KeywordExtractor;
pub use session_registry::{SessionHandle, SessionId, SessionRegistry};
pub use test_dependencies::{InMemoryCompanyStore, MockCompanyExtractor, TestDependencies};
pub use traits::*;
