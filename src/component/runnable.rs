//! The `Runnable` trait every managed component implements.

use async_trait::async_trait;

use crate::component::{ComponentError, StopSignal};
use crate::flags::FlagSet;
use crate::service::ServiceContext;

/// # A component whose lifecycle is driven by a [`Service`](crate::Service).
///
/// The service calls the methods in this order:
/// `init_flags` (all components) → `configure` (sequential, registration order)
/// → `run` (concurrent, one task per component) → `stop` (concurrent fan-out).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use svckit::{ComponentError, Flag, FlagSet, Runnable, ServiceContext, StopSignal};
///
/// struct Greeter {
///     greeting: Flag<String>,
/// }
///
/// #[async_trait]
/// impl Runnable for Greeter {
///     fn name(&self) -> &str { "greeter" }
///
///     fn init_flags(&self, flags: &mut FlagSet) {
///         flags.register(&self.greeting);
///     }
///
///     async fn configure(&self, _ctx: &ServiceContext) -> Result<(), ComponentError> {
///         if self.greeting.get().is_empty() {
///             return Err(ComponentError::MissingParameter(self.greeting.name().into()));
///         }
///         Ok(())
///     }
///
///     async fn run(&self, ctx: &ServiceContext) -> Result<(), ComponentError> {
///         self.configure(ctx).await
///     }
///
///     fn stop(&self) -> StopSignal { StopSignal::ready() }
/// }
/// ```
#[async_trait]
pub trait Runnable: Send + Sync + 'static {
    /// Stable identity used in logs and error reports.
    fn name(&self) -> &str;

    /// Registers this component's parameters. Must not fail.
    ///
    /// Parameter names should carry the component's prefix so several instances
    /// of the same kind can coexist.
    fn init_flags(&self, flags: &mut FlagSet);

    /// Validates parameters and materializes resources (connections, clients).
    ///
    /// Called once, after every component's flags have been resolved.
    async fn configure(&self, ctx: &ServiceContext) -> Result<(), ComponentError>;

    /// Runs the component's duty cycle.
    ///
    /// Components without background work usually re-run `configure` and return.
    /// Components with a duty cycle hold this call until stopped. Returning an
    /// error stops the whole service.
    async fn run(&self, ctx: &ServiceContext) -> Result<(), ComponentError>;

    /// Requests shutdown and returns a signal that completes once teardown is done.
    ///
    /// Must complete promptly when the component was never configured or started.
    fn stop(&self) -> StopSignal;
}

/// # A component that knows its own registry key.
///
/// [`ServiceBuilder::with_runnable`](crate::ServiceBuilder::with_runnable) uses
/// it to register the component without an explicit prefix.
pub trait HasPrefix {
    /// Registry key (and flag-name prefix) of this component.
    fn prefix(&self) -> &str;
}

/// # A component that hands back a typed inner value.
///
/// `Target` is usually a cheap handle (an `Arc`'d client, a sender) that callers
/// use after looking the component up with
/// [`ServiceContext::get_target`](crate::ServiceContext::get_target).
pub trait Retrievable {
    /// Value handed back to callers.
    type Target: Clone + Send + Sync + 'static;

    /// Returns the inner value, or `None` until the component is ready.
    fn get(&self) -> Option<Self::Target>;
}
