//! Built-in routes.

use serde::Serialize;

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub version: String,
    pub env: String,
}

pub async fn ping() -> &'static str {
    "pong"
}
