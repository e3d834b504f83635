//! One-shot stop completion and the cancel/running helper behind it.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;

use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Completion signal returned by [`Runnable::stop`](crate::Runnable::stop).
///
/// Awaiting consumes the signal, so each one is observed at most once.
pub struct StopSignal {
    inner: Option<BoxFuture>,
}

impl StopSignal {
    /// A signal that is already complete.
    pub fn ready() -> Self {
        Self { inner: None }
    }

    /// Completes when `fut` does.
    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(fut)),
        }
    }

    /// Creates a signal together with the sender that completes it.
    ///
    /// Dropping the sender also completes the signal, so a panicking teardown
    /// cannot leave the orchestrator waiting.
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        let signal = Self::from_future(async move {
            let _ = rx.await;
        });
        (tx, signal)
    }

    /// Returns `true` if the signal needs no waiting.
    pub fn is_ready(&self) -> bool {
        self.inner.is_none()
    }

    /// Waits for teardown to finish.
    pub async fn wait(self) {
        if let Some(fut) = self.inner {
            fut.await;
        }
    }
}

impl IntoFuture for StopSignal {
    type Output = ();
    type IntoFuture = BoxFuture;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopSignal")
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Cancel token plus "is `run` active" bookkeeping for a component.
///
/// ```text
/// run():  let _guard = lifeline.enter();  ... select on lifeline.cancelled() ...
/// stop(): lifeline.stop()  → cancel token → signal completes when guard drops
/// ```
///
/// If `run` never entered, the returned signal completes immediately.
#[derive(Debug)]
pub struct Lifeline {
    token: CancellationToken,
    running: watch::Sender<bool>,
}

impl Lifeline {
    pub fn new() -> Self {
        let (running, _) = watch::channel(false);
        Self {
            token: CancellationToken::new(),
            running,
        }
    }

    /// Marks `run` as active until the guard is dropped.
    pub fn enter(&self) -> RunningGuard {
        self.running.send_replace(true);
        RunningGuard {
            running: self.running.clone(),
        }
    }

    /// Token cancelled by [`Lifeline::stop`].
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Resolves once a stop was requested.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Cancels the token and returns a signal for the end of `run`.
    pub fn stop(&self) -> StopSignal {
        self.token.cancel();
        if !self.is_running() {
            return StopSignal::ready();
        }
        let mut rx = self.running.subscribe();
        StopSignal::from_future(async move {
            let _ = rx.wait_for(|running| !*running).await;
        })
    }
}

impl Default for Lifeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the running flag of a [`Lifeline`] on drop.
#[derive(Debug)]
pub struct RunningGuard {
    running: watch::Sender<bool>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.running.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn stop_before_run_completes_immediately() {
        let lifeline = Lifeline::new();
        let signal = lifeline.stop();
        assert!(signal.is_ready());
        signal.await;
        assert!(lifeline.is_cancelled());
    }

    #[tokio::test]
    async fn stop_waits_for_run_to_exit() {
        let lifeline = Arc::new(Lifeline::new());
        let (entered_tx, entered_rx) = oneshot::channel();

        let worker = lifeline.clone();
        let handle = tokio::spawn(async move {
            let _guard = worker.enter();
            let _ = entered_tx.send(());
            worker.cancelled().await;
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        entered_rx.await.unwrap();
        let signal = lifeline.stop();
        assert!(!signal.is_ready());
        tokio::time::timeout(Duration::from_secs(2), signal)
            .await
            .expect("stop signal should complete after run exits");
        assert!(!lifeline.is_running());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_sender_completes_channel_signal() {
        let (tx, signal) = StopSignal::channel();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), signal.wait())
            .await
            .unwrap();
    }
}
