//! Read-only facade over a service, shared with components and caller code.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::Span;

use crate::component::{Retrievable, Runnable};
use crate::flags::Flag;
use crate::http::HttpServer;
use crate::registry::{LookupError, Registry};

pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) env: Flag<String>,
    pub(crate) registry: Registry,
    pub(crate) http: Option<Arc<HttpServer>>,
    pub(crate) registered: AtomicBool,
}

/// Handle passed to every component's `configure` and `run`.
///
/// Cheap to clone. Lookups are safe from any number of tasks at once.
#[derive(Clone)]
pub struct ServiceContext {
    shared: Arc<Shared>,
}

impl ServiceContext {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn version(&self) -> &str {
        &self.shared.version
    }

    /// Value of the `app-env` flag ("dev" until flags are parsed).
    pub fn env(&self) -> String {
        self.shared.env.get()
    }

    /// Span scoping log output to one component.
    ///
    /// ```
    /// # fn demo(ctx: &svckit::ServiceContext) {
    /// let _entered = ctx.logger("redis").entered();
    /// tracing::info!("connecting");
    /// # }
    /// ```
    pub fn logger(&self, prefix: &str) -> Span {
        tracing::info_span!("component", service = %self.shared.name, prefix = %prefix)
    }

    /// Best-effort typed lookup.
    pub fn get<T: Any + Send + Sync>(&self, prefix: &str) -> Option<Arc<T>> {
        self.shared.registry.get(prefix)
    }

    pub fn try_get<T: Any + Send + Sync>(&self, prefix: &str) -> Result<Arc<T>, LookupError> {
        self.shared.registry.try_get(prefix)
    }

    /// Typed lookup for a dependency that must exist.
    ///
    /// # Panics
    /// Panics if `prefix` is unregistered or holds another type.
    pub fn must_get<T: Any + Send + Sync>(&self, prefix: &str) -> Arc<T> {
        self.shared.registry.must_get(prefix)
    }

    /// Lifecycle view of a component, whatever its concrete type.
    pub fn get_runnable(&self, prefix: &str) -> Option<Arc<dyn Runnable>> {
        self.shared.registry.get_runnable(prefix)
    }

    /// Inner value of a [`Retrievable`] component.
    pub fn get_target<C>(&self, prefix: &str) -> Option<C::Target>
    where
        C: Retrievable + Any + Send + Sync,
    {
        self.shared.registry.get_target::<C>(prefix)
    }

    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    /// The embedded HTTP server, if the service has one.
    pub fn http_server(&self) -> Option<&Arc<HttpServer>> {
        self.shared.http.as_ref()
    }

    /// Whether an external discovery mechanism accepted the service.
    pub fn is_registered(&self) -> bool {
        self.shared.registered.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("name", &self.shared.name)
            .field("version", &self.shared.version)
            .field("registry", &self.shared.registry)
            .finish()
    }
}
