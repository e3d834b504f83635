//! # Closure-backed component (`WorkerFn`)
//!
//! [`WorkerFn`] wraps `F: Fn(ServiceContext, CancellationToken) -> Fut` so a
//! background loop can join the lifecycle without a dedicated type.
//!
//! - No flags, nothing to configure
//! - `run` builds a fresh future from the closure and awaits it
//! - `stop` cancels the token and completes once that future has returned
//!
//! ```
//! use std::time::Duration;
//! use svckit::WorkerFn;
//!
//! let ticker = WorkerFn::new("ticker", "ticker", |ctx, token| async move {
//!     let mut interval = tokio::time::interval(Duration::from_secs(1));
//!     loop {
//!         tokio::select! {
//!             _ = token.cancelled() => return Ok(()),
//!             _ = interval.tick() => tracing::debug!(service = %ctx.name(), "tick"),
//!         }
//!     }
//! });
//! assert_eq!(svckit::HasPrefix::prefix(&ticker), "ticker");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::component::{ComponentError, HasPrefix, Lifeline, Retrievable, Runnable, StopSignal};
use crate::flags::FlagSet;
use crate::service::ServiceContext;

/// Function-backed component.
pub struct WorkerFn<F> {
    name: Cow<'static, str>,
    prefix: String,
    f: F,
    lifeline: Lifeline,
}

impl<F> WorkerFn<F> {
    pub fn new<Fut>(name: impl Into<Cow<'static, str>>, prefix: impl Into<String>, f: F) -> Self
    where
        F: Fn(ServiceContext, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ComponentError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            prefix: prefix.into(),
            f,
            lifeline: Lifeline::new(),
        }
    }

    /// Whether the closure's future is currently being awaited.
    pub fn is_running(&self) -> bool {
        self.lifeline.is_running()
    }
}

#[async_trait]
impl<F, Fut> Runnable for WorkerFn<F>
where
    F: Fn(ServiceContext, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ComponentError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn init_flags(&self, _flags: &mut FlagSet) {}

    async fn configure(&self, _ctx: &ServiceContext) -> Result<(), ComponentError> {
        Ok(())
    }

    async fn run(&self, ctx: &ServiceContext) -> Result<(), ComponentError> {
        let _running = self.lifeline.enter();
        if self.lifeline.is_cancelled() {
            return Ok(());
        }
        (self.f)(ctx.clone(), self.lifeline.token()).await
    }

    fn stop(&self) -> StopSignal {
        self.lifeline.stop()
    }
}

impl<F> HasPrefix for WorkerFn<F> {
    fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl<F> Retrievable for WorkerFn<F> {
    /// Token cancelled when the worker is asked to stop.
    type Target = CancellationToken;

    fn get(&self) -> Option<CancellationToken> {
        Some(self.lifeline.token())
    }
}

impl<F> fmt::Debug for WorkerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerFn")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("running", &self.lifeline.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let worker = WorkerFn::new("ticker", "tick", |_ctx, _token| async { Ok(()) });
        assert_eq!(Runnable::name(&worker), "ticker");
        assert_eq!(HasPrefix::prefix(&worker), "tick");
        assert!(!worker.is_running());
    }

    #[tokio::test]
    async fn test_stop_before_run_is_immediate() {
        let worker = WorkerFn::new("w", "w", |_ctx, _token| async { Ok(()) });
        tokio::time::timeout(std::time::Duration::from_secs(1), worker.stop().wait())
            .await
            .expect("stop should complete for a worker that never ran");
        assert!(worker.get().is_some_and(|t| t.is_cancelled()));
    }
}
