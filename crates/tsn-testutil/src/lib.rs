//! Test infrastructure for the orchestration pipelines.
//!
//! [`MockSouthbound`] records every call it receives and can be scripted
//! to fail specific operations, delay them, or answer synchronization
//! queries from a canned sequence. [`fixtures`] builds the projects and
//! profile sets the pipeline tests run against.

pub mod fixtures;
mod mock;

pub use mock::MockSouthbound;

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
