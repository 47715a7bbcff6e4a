//! Test doubles for the Kubernetes API server and the log exporters
#![allow(dead_code)]

pub mod exporter;
pub mod store;

use std::time::Duration;

use e2e_test_support::settings::Settings;

/// Installs a subscriber which prints log events of the library in the
/// test output; `RUST_LOG` overrides the level.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("e2e_test_support=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Settings with short timeouts
pub fn test_settings() -> Settings {
    Settings {
        poll_interval: Duration::from_secs(1),
        create_timeout: Duration::from_secs(60),
        delete_timeout: Duration::from_secs(10),
        ..Settings::default()
    }
}
