//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to `default_directives`.
///
/// Returns `false` when a global subscriber is already set (e.g. a second call
/// from another test).
pub fn init_tracing(default_directives: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
