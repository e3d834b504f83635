//! Shutdown requests for a running service.

use tokio_util::sync::CancellationToken;

/// Cloneable handle used to ask a service to stop.
///
/// All clones share one request; once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request shutdown.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("Shutdown requested");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been requested.
    pub async fn requested(&self) {
        self.token.cancelled().await
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_before_wait_is_observed() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        shutdown.trigger();
        assert!(observer.is_triggered());
        tokio::time::timeout(Duration::from_millis(100), observer.requested())
            .await
            .expect("request made earlier must still resolve");
    }
}
