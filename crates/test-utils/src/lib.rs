//! Shared test utilities for the GraphQL project cache crates.

pub mod assertions;
pub mod endpoint;
pub mod fixtures;
pub mod project;
pub mod tracking;

pub use assertions::{definition_names, format_definitions};
pub use endpoint::MockEndpointLoader;
pub use project::TestProject;
pub use tracking::TrackingFileSystem;

/// Installs a test-friendly `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_test_writer()
        .try_init();
}
