//! Shared components and builders for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use svckit::{
    ComponentError, Flag, FlagSet, FlagSources, HasPrefix, LifecycleState, Lifeline, Retrievable,
    Runnable, Service, ServiceBuilder, ServiceContext, StopSignal,
};

/// Ordered record of lifecycle calls across every recorder sharing it.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries starting with `phase:` in call order, e.g. `with_phase("configure")`.
    pub fn with_phase(&self, phase: &str) -> Vec<String> {
        let marker = format!("{phase}:");
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(&marker))
            .collect()
    }
}

/// What a recorder's `run` does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Return `Ok` straight away.
    Return,
    /// Hold until stopped.
    Block,
    /// Hold forever, ignoring cancellation.
    Ignore,
    /// Return an error straight away.
    Fail,
    Panic,
}

/// Recording component with switchable failure modes.
///
/// `get` yields the endpoint only after a successful `configure`.
pub struct Recorder {
    prefix: String,
    log: CallLog,
    uri: Flag<String>,
    lifeline: Lifeline,
    run_mode: RunMode,
    fail_configure: bool,
    panic_in_configure: bool,
    configure_delay: Option<Duration>,
    hang_on_stop: bool,
    configured: AtomicBool,
    pub configure_calls: AtomicUsize,
    pub run_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Recorder {
    pub fn new(prefix: &str, log: &CallLog) -> Self {
        Self {
            prefix: prefix.to_string(),
            log: log.clone(),
            uri: Flag::prefixed(prefix, "uri", format!("mem://{prefix}"), "backend endpoint"),
            lifeline: Lifeline::new(),
            run_mode: RunMode::Block,
            fail_configure: false,
            panic_in_configure: false,
            configure_delay: None,
            hang_on_stop: false,
            configured: AtomicBool::new(false),
            configure_calls: AtomicUsize::new(0),
            run_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.run_mode = mode;
        self
    }

    pub fn failing_configure(mut self) -> Self {
        self.fail_configure = true;
        self
    }

    pub fn panicking_configure(mut self) -> Self {
        self.panic_in_configure = true;
        self
    }

    /// `configure` sleeps for `delay` before succeeding.
    pub fn slow_configure(mut self, delay: Duration) -> Self {
        self.configure_delay = Some(delay);
        self
    }

    /// `stop` cancels the run but never acknowledges.
    pub fn hanging_stop(mut self) -> Self {
        self.hang_on_stop = true;
        self
    }

    pub fn uri(&self) -> String {
        self.uri.get()
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    pub fn configures(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runnable for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn init_flags(&self, flags: &mut FlagSet) {
        flags.register(&self.uri);
    }

    async fn configure(&self, _ctx: &ServiceContext) -> Result<(), ComponentError> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("configure:{}", self.prefix));
        if let Some(delay) = self.configure_delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic_in_configure {
            panic!("{} lost its settings", self.prefix);
        }
        if self.fail_configure {
            return Err(ComponentError::Unavailable(format!("{} refused", self.uri())));
        }
        self.configured.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn run(&self, _ctx: &ServiceContext) -> Result<(), ComponentError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("run:{}", self.prefix));
        match self.run_mode {
            RunMode::Return => Ok(()),
            RunMode::Fail => Err(ComponentError::InvalidParameter {
                name: self.uri.name().to_string(),
                reason: "broken on purpose".to_string(),
            }),
            RunMode::Panic => panic!("recorder {} exploded", self.prefix),
            RunMode::Block => {
                let _running = self.lifeline.enter();
                self.lifeline.cancelled().await;
                Ok(())
            }
            RunMode::Ignore => {
                let _running = self.lifeline.enter();
                std::future::pending().await
            }
        }
    }

    fn stop(&self) -> StopSignal {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("stop:{}", self.prefix));
        let signal = self.lifeline.stop();
        if self.hang_on_stop {
            return StopSignal::from_future(std::future::pending());
        }
        signal
    }
}

impl HasPrefix for Recorder {
    fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Retrievable for Recorder {
    type Target = String;

    fn get(&self) -> Option<String> {
        self.is_configured().then(|| self.uri())
    }
}

/// Builder that ignores the real command line, environment, and signals.
pub fn hermetic_builder() -> ServiceBuilder {
    Service::builder()
        .name("test-service")
        .version("9.9.9")
        .handle_signals(false)
        .shutdown_timeout(Duration::from_secs(5))
        .flag_sources(FlagSources::from_args(Vec::<String>::new()))
}

/// Waits until the service reaches `state`, failing the test after two seconds.
pub async fn wait_for_state(service: &Service, state: LifecycleState) {
    let mut rx = service.subscribe_state();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| *s == state))
        .await
        .unwrap_or_else(|_| panic!("service never reached {state}"))
        .unwrap();
}
