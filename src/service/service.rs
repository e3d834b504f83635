//! # Service: drives registered components through init, start, and stop.
//!
//! ```text
//! init():
//!   Created ──► init_flags(app-env, http server, components...)  (all, in order)
//!          ──► FlagSet::parse(sources)
//!          ──► configure(ctx) one by one, in order
//!                 └─ first Err ─► Failed, ServiceError::Configure (no rollback)
//!          ──► Initialized
//!
//! start():
//!   Initialized ──► Running
//!     JoinSet: [http server run] [component 1 run] ... [component N run]
//!     wait for the first of:
//!        ├─ Err from a run (or panic) ─► remember error
//!        ├─ Shutdown::trigger() / Service::stop() / OS signal
//!        └─ every run returned Ok
//!     stop()            (fan-out, exactly once)
//!     drain run tasks   (same deadline as the stop fan-out, leftovers aborted)
//!   ──► Stopped (or Failed when a component failed)
//!
//! stop():
//!   Stopping ──► spawn stop() per component ──► await all signals (optional deadline)
//!            ──► Stopped
//! ```

use std::collections::HashSet;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{watch, OnceCell};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::Instrument;

use crate::component::{ComponentError, Runnable};
use crate::flags::{FlagSet, FlagSources};
use crate::http::HttpServer;
use crate::lifecycle::{signals, LifecycleState, Shutdown};
use crate::observability::metrics;
use crate::service::builder::ServiceBuilder;
use crate::service::context::{ServiceContext, Shared};
use crate::service::error::ServiceError;

/// A component as seen by the lifecycle loops.
#[derive(Clone)]
struct Unit {
    prefix: String,
    runnable: Arc<dyn Runnable>,
}

type RunResult = Result<Result<(), ComponentError>, String>;

/// Orchestrator owning the registry and the lifecycle state machine.
///
/// Methods take `&self`; wrap the service in an `Arc` to call [`Service::stop`]
/// from another task while [`Service::start`] is blocked.
pub struct Service {
    ctx: ServiceContext,
    shared: Arc<Shared>,
    sources: FlagSources,
    flags: OnceLock<FlagSet>,
    state: watch::Sender<LifecycleState>,
    init_claimed: AtomicBool,
    failed: AtomicBool,
    shutdown: Shutdown,
    stopped: OnceCell<Vec<String>>,
    stop_deadline: OnceLock<Instant>,
    shutdown_timeout: Option<Duration>,
    handle_signals: bool,
}

impl Service {
    /// Starts a [`ServiceBuilder`].
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    pub(crate) fn from_parts(
        shared: Arc<Shared>,
        sources: FlagSources,
        shutdown_timeout: Option<Duration>,
        handle_signals: bool,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Created);
        metrics::record_state(&shared.name, LifecycleState::Created);
        Self {
            ctx: ServiceContext::new(shared.clone()),
            shared,
            sources,
            flags: OnceLock::new(),
            state,
            init_claimed: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            shutdown: Shutdown::new(),
            stopped: OnceCell::new(),
            stop_deadline: OnceLock::new(),
            shutdown_timeout,
            handle_signals,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn version(&self) -> &str {
        &self.shared.version
    }

    pub fn env(&self) -> String {
        self.ctx.env()
    }

    /// Facade handed to components; clone it freely.
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn http_server(&self) -> Option<&Arc<HttpServer>> {
        self.shared.http.as_ref()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Handle that makes a blocked [`Service::start`] return cleanly.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn is_registered(&self) -> bool {
        self.ctx.is_registered()
    }

    /// Set by whatever discovery mechanism the service reports to.
    pub fn set_registered(&self, registered: bool) {
        self.shared.registered.store(registered, Ordering::Release);
    }

    /// Resolves flags and configures every component in registration order.
    ///
    /// Stops at the first `configure` failure (or panic) and leaves the service
    /// `Failed`. Components configured before it stay configured. Fails with
    /// [`ServiceError::InvalidState`] if the service was stopped meanwhile.
    pub async fn init(&self) -> Result<(), ServiceError> {
        let state = self.state();
        if state != LifecycleState::Created || self.init_claimed.swap(true, Ordering::AcqRel) {
            return Err(ServiceError::InvalidState {
                operation: "init",
                state,
            });
        }

        let units = self.units();
        let flags = self.collect_flags(&units);
        if let Err(e) = flags.parse(&self.sources) {
            tracing::error!(service = %self.name(), error = %e, "Flag resolution failed");
            self.fail();
            return Err(e.into());
        }
        let _ = self.flags.set(flags);

        for unit in &units {
            let span = self.ctx.logger(&unit.prefix);
            let configure = unit.runnable.configure(&self.ctx).instrument(span);
            let outcome = match AssertUnwindSafe(configure).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(payload) => {
                    let message = panic_message(payload);
                    metrics::record_configure(&unit.prefix, false);
                    tracing::error!(prefix = %unit.prefix, panic = %message, "Component configure panicked");
                    self.fail();
                    return Err(ServiceError::Panicked {
                        phase: "configure",
                        name: unit.runnable.name().to_string(),
                        prefix: unit.prefix.clone(),
                        message,
                    });
                }
            };
            match outcome {
                Ok(()) => {
                    metrics::record_configure(&unit.prefix, true);
                    tracing::debug!(prefix = %unit.prefix, component = %unit.runnable.name(), "Component configured");
                }
                Err(source) => {
                    metrics::record_configure(&unit.prefix, false);
                    tracing::error!(
                        prefix = %unit.prefix,
                        component = %unit.runnable.name(),
                        error = %source,
                        "Component configuration failed"
                    );
                    self.fail();
                    return Err(ServiceError::Configure {
                        name: unit.runnable.name().to_string(),
                        prefix: unit.prefix.clone(),
                        source,
                    });
                }
            }
        }

        // A stop issued while configure was awaiting wins; its state is final.
        let initialized = self.state.send_if_modified(|state| {
            if *state == LifecycleState::Created {
                *state = LifecycleState::Initialized;
                true
            } else {
                false
            }
        });
        if !initialized {
            let state = self.state();
            tracing::warn!(service = %self.name(), state = %state, "Service stopped during init");
            return Err(ServiceError::InvalidState {
                operation: "init",
                state,
            });
        }
        metrics::record_state(self.name(), LifecycleState::Initialized);
        tracing::info!(
            service = %self.name(),
            version = %self.version(),
            env = %self.env(),
            components = units.len(),
            "Service initialized"
        );
        Ok(())
    }

    /// Runs every component concurrently until one fails, shutdown is requested,
    /// or all of them return. Always stops every component before returning.
    pub async fn start(&self) -> Result<(), ServiceError> {
        let transitioned = self.state.send_if_modified(|state| {
            if *state == LifecycleState::Initialized {
                *state = LifecycleState::Running;
                true
            } else {
                false
            }
        });
        if !transitioned {
            return Err(ServiceError::InvalidState {
                operation: "start",
                state: self.state(),
            });
        }
        metrics::record_state(self.name(), LifecycleState::Running);
        tracing::info!(service = %self.name(), "Service starting");

        let units = self.units();
        let mut set = JoinSet::new();
        for (idx, unit) in units.iter().enumerate() {
            let runnable = unit.runnable.clone();
            let ctx = self.ctx.clone();
            let span = self.ctx.logger(&unit.prefix);
            set.spawn(async move {
                let run = async move { runnable.run(&ctx).await }.instrument(span);
                let result: RunResult = AssertUnwindSafe(run)
                    .catch_unwind()
                    .await
                    .map_err(panic_message);
                (idx, result)
            });
        }

        let outcome = self.wait_for_exit(&units, &mut set).await;
        if outcome.is_err() {
            self.failed.store(true, Ordering::Release);
        }

        if let Err(e) = self.stop().await {
            tracing::warn!(service = %self.name(), error = %e, "Service stop incomplete");
        }
        self.drain(&units, &mut set).await;

        if outcome.is_err() {
            self.set_state(LifecycleState::Failed);
        }
        outcome
    }

    /// Stops every component concurrently and waits for all acknowledgements.
    ///
    /// Idempotent: the fan-out happens once and later callers wait for the same
    /// result. Returns [`ServiceError::GraceExceeded`] if the shutdown timeout
    /// elapsed first; the stuck components are only reported, never retried.
    pub async fn stop(&self) -> Result<(), ServiceError> {
        let stuck = self.stopped.get_or_init(|| self.fan_out_stop()).await;
        if stuck.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::GraceExceeded {
                grace: self.shutdown_timeout.unwrap_or_default(),
                stuck: stuck.clone(),
            })
        }
    }

    /// Resolved parameters as `KEY=VALUE` lines.
    ///
    /// Before `init` the flag sources are resolved on the spot, without
    /// configuring anything.
    pub fn out_env(&self) -> Result<String, ServiceError> {
        if let Some(flags) = self.flags.get() {
            return Ok(flags.render_env());
        }
        let flags = self.collect_flags(&self.units());
        flags.parse(&self.sources)?;
        Ok(flags.render_env())
    }

    /// Writes [`Service::out_env`] to `out`, e.g. stdout redirected to `.env`.
    pub fn write_env<W: io::Write>(&self, mut out: W) -> Result<(), ServiceError> {
        out.write_all(self.out_env()?.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    /// Embedded server first, then registered components in order.
    fn units(&self) -> Vec<Unit> {
        let mut units = Vec::with_capacity(self.shared.registry.len() + 1);
        if let Some(server) = &self.shared.http {
            units.push(Unit {
                prefix: server.prefix().to_string(),
                runnable: server.clone(),
            });
        }
        units.extend(self.shared.registry.iter().map(|(prefix, runnable)| Unit {
            prefix: prefix.to_string(),
            runnable: runnable.clone(),
        }));
        units
    }

    fn collect_flags(&self, units: &[Unit]) -> FlagSet {
        let mut flags = FlagSet::new();
        flags.register(&self.shared.env);
        for unit in units {
            unit.runnable.init_flags(&mut flags);
        }
        flags
    }

    async fn wait_for_exit(
        &self,
        units: &[Unit],
        set: &mut JoinSet<(usize, RunResult)>,
    ) -> Result<(), ServiceError> {
        let signal = wait_for_signal(self.handle_signals);
        tokio::pin!(signal);

        loop {
            tokio::select! {
                _ = self.shutdown.requested() => {
                    tracing::info!(service = %self.name(), "Shutdown requested");
                    return Ok(());
                }
                _ = &mut signal => {
                    return Ok(());
                }
                joined = set.join_next() => match joined {
                    None => {
                        tracing::info!(service = %self.name(), "All components returned");
                        return Ok(());
                    }
                    Some(Ok((idx, Ok(Ok(()))))) => {
                        tracing::debug!(prefix = %units[idx].prefix, "Component run returned");
                    }
                    Some(Ok((idx, Ok(Err(source))))) => {
                        let unit = &units[idx];
                        metrics::record_run_failure(&unit.prefix, source.as_label());
                        tracing::error!(prefix = %unit.prefix, error = %source, "Component run failed");
                        return Err(ServiceError::Run {
                            name: unit.runnable.name().to_string(),
                            prefix: unit.prefix.clone(),
                            source,
                        });
                    }
                    Some(Ok((idx, Err(message)))) => {
                        let unit = &units[idx];
                        metrics::record_run_failure(&unit.prefix, "panic");
                        tracing::error!(prefix = %unit.prefix, panic = %message, "Component run panicked");
                        return Err(ServiceError::Panicked {
                            phase: "run",
                            name: unit.runnable.name().to_string(),
                            prefix: unit.prefix.clone(),
                            message,
                        });
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Component run task ended abnormally");
                    }
                }
            }
        }
    }

    async fn fan_out_stop(&self) -> Vec<String> {
        self.shutdown.trigger();
        if !self.state().is_terminal() {
            self.set_state(LifecycleState::Stopping);
        }
        tracing::info!(service = %self.name(), "Stopping service...");

        let units = self.units();
        let mut pending: HashSet<String> = units.iter().map(|u| u.prefix.clone()).collect();
        let mut set = JoinSet::new();
        for unit in units {
            set.spawn(async move {
                unit.runnable.stop().wait().await;
                unit.prefix
            });
        }

        let wait_all = async {
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok(prefix) => {
                        metrics::record_stop(&prefix, true);
                        tracing::debug!(prefix = %prefix, "Component stopped");
                        pending.remove(&prefix);
                    }
                    Err(e) => tracing::warn!(error = %e, "Component stop panicked"),
                }
            }
        };

        let stuck = match self.deadline() {
            Some(deadline) => match tokio::time::timeout_at(deadline, wait_all).await {
                Ok(()) => Vec::new(),
                Err(_) => {
                    set.abort_all();
                    let mut stuck: Vec<String> = pending.into_iter().collect();
                    stuck.sort_unstable();
                    for prefix in &stuck {
                        metrics::record_stop(prefix, false);
                    }
                    tracing::warn!(grace = ?self.shutdown_timeout, stuck = ?stuck, "Components did not stop in time");
                    stuck
                }
            },
            None => {
                wait_all.await;
                Vec::new()
            }
        };

        if self.failed.load(Ordering::Acquire) || self.state() == LifecycleState::Failed {
            self.set_state(LifecycleState::Failed);
        } else {
            self.set_state(LifecycleState::Stopped);
        }
        tracing::info!(service = %self.name(), "Service stopped");
        stuck
    }

    /// Shutdown deadline, fixed when the stop fan-out begins and shared with `drain`.
    fn deadline(&self) -> Option<Instant> {
        let grace = self.shutdown_timeout?;
        Some(*self.stop_deadline.get_or_init(|| Instant::now() + grace))
    }

    /// Waits for run tasks to notice the stop, aborting any that outlive the
    /// same deadline the stop fan-out used.
    async fn drain(&self, units: &[Unit], set: &mut JoinSet<(usize, RunResult)>) {
        let done = async {
            while let Some(joined) = set.join_next().await {
                if let Ok((idx, Ok(Err(e)))) = joined {
                    tracing::warn!(prefix = %units[idx].prefix, error = %e, "Component run failed during shutdown");
                }
            }
        };

        match self.deadline() {
            Some(deadline) => {
                if tokio::time::timeout_at(deadline, done).await.is_err() {
                    tracing::warn!(remaining = set.len(), "Aborting component runs still active after stop");
                    set.abort_all();
                }
            }
            None => done.await,
        }
    }

    fn fail(&self) {
        self.failed.store(true, Ordering::Release);
        if !self.state().is_terminal() {
            self.set_state(LifecycleState::Failed);
        }
    }

    fn set_state(&self, next: LifecycleState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            metrics::record_state(self.name(), next);
            tracing::debug!(service = %self.name(), from = %prev, to = %next, "Lifecycle transition");
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.shared.name)
            .field("version", &self.shared.version)
            .field("state", &self.state())
            .field("registry", &self.shared.registry)
            .finish()
    }
}

/// Resolves on an OS termination signal; never resolves when disabled.
async fn wait_for_signal(enabled: bool) {
    if !enabled {
        return std::future::pending().await;
    }
    if let Err(e) = signals::wait_for_shutdown_signal().await {
        tracing::warn!(error = %e, "Cannot install signal handlers; relying on explicit shutdown");
        std::future::pending::<()>().await;
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
