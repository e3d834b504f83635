//! Configuration schema definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for a service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name used in logs and the status endpoint.
    pub name: String,

    /// Service version string.
    pub version: String,

    /// Default for the `app-env` flag (e.g. "dev", "stg", "prd").
    pub env: String,

    /// Upper bound on the stop fan-out. `None` waits indefinitely.
    pub shutdown_timeout_secs: Option<u64>,

    /// Listen for SIGINT/SIGTERM while running.
    pub handle_signals: bool,
}

impl ServiceConfig {
    pub fn shutdown_timeout(&self) -> Option<Duration> {
        self.shutdown_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "service".to_string(),
            version: "0.0.0".to_string(),
            env: "dev".to_string(),
            shutdown_timeout_secs: Some(30),
            handle_signals: true,
        }
    }
}
