//! Tracing subscriber setup for the host.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Installs a formatted subscriber filtered at the configured level.
/// `RUST_LOG`, when set, takes precedence.
///
/// Does nothing if a global subscriber is already installed, so tests and
/// embedding applications can set their own.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
