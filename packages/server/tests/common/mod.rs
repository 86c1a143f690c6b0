// Common test utilities

pub mod harness;
pub mod server;

pub use harness::*;
pub use server::*;

/// Install a test-writer tracing subscriber once per test binary.
///
/// Run tests with: RUST_LOG=debug cargo test -- --nocapture
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
