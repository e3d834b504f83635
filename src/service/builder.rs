//! Options applied to a service before it exists.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crate::component::{HasPrefix, Runnable};
use crate::config::{validate_config, ConfigError, ServiceConfig};
use crate::flags::{EnvSource, Flag, FlagSources};
use crate::http::HttpServer;
use crate::registry::{Registry, RegistryError};
use crate::service::context::Shared;
use crate::service::error::ServiceError;
use crate::service::service::Service;

/// Builder for a [`Service`].
///
/// Options apply left to right; a later option overrides an earlier one. The
/// builder is consumed by [`ServiceBuilder::build`], so nothing can be changed
/// once the service exists.
///
/// # Example
/// ```no_run
/// use svckit::{HttpServer, Service, WorkerFn};
///
/// # async fn demo() -> Result<(), svckit::ServiceError> {
/// let service = Service::builder()
///     .name("demo")
///     .version("1.0.0")
///     .with_http_server(HttpServer::new("http"))
///     .with_runnable(WorkerFn::new("ticker", "ticker", |_ctx, token| async move {
///         token.cancelled().await;
///         Ok(())
///     }))
///     .build()?;
///
/// service.init().await?;
/// service.start().await
/// # }
/// ```
pub struct ServiceBuilder {
    config: ServiceConfig,
    registry: Registry,
    registry_error: Option<RegistryError>,
    http: Option<Arc<HttpServer>>,
    sources: Option<FlagSources>,
    timeout_override: Option<Option<Duration>>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            registry: Registry::new(),
            registry_error: None,
            http: None,
            sources: None,
            timeout_override: None,
        }
    }

    /// Replaces every config-backed option at once.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self.timeout_override = None;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Default for the `app-env` flag.
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.config.env = env.into();
        self
    }

    /// Deadline for the stop fan-out.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_override = Some(Some(timeout));
        self
    }

    /// Waits for every component's stop acknowledgement without a deadline.
    pub fn no_shutdown_timeout(mut self) -> Self {
        self.timeout_override = Some(None);
        self
    }

    pub fn handle_signals(mut self, enabled: bool) -> Self {
        self.config.handle_signals = enabled;
        self
    }

    /// Registers a component under its own prefix.
    pub fn with_runnable<R>(self, component: R) -> Self
    where
        R: Runnable + HasPrefix,
    {
        self.with_runnable_arc(Arc::new(component))
    }

    /// Registers a shared component under its own prefix; the caller keeps a handle.
    pub fn with_runnable_arc<R>(self, component: Arc<R>) -> Self
    where
        R: Runnable + HasPrefix,
    {
        let prefix = component.prefix().to_string();
        self.register(prefix, component)
    }

    /// Registers a component under an explicit prefix.
    pub fn with_runnable_as<R: Runnable>(self, prefix: impl Into<String>, component: R) -> Self {
        self.register(prefix.into(), Arc::new(component))
    }

    /// Attaches the embedded HTTP server.
    pub fn with_http_server(mut self, server: HttpServer) -> Self {
        self.http = Some(Arc::new(server));
        self
    }

    /// Where flag values come from. Defaults to the process command line,
    /// environment, and `ENV_FILE` (or `.env`).
    pub fn flag_sources(mut self, sources: FlagSources) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Command-line arguments, without the program name. Environment is still read.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base = self.sources.take().unwrap_or_else(FlagSources::from_process);
        let fresh = FlagSources::from_args(args);
        self.sources = Some(FlagSources {
            args: fresh.args,
            ..base
        });
        self
    }

    /// Environment source, e.g. a fixed map in tests.
    pub fn env_source(mut self, env: EnvSource) -> Self {
        let base = self.sources.take().unwrap_or_else(FlagSources::from_process);
        self.sources = Some(base.with_env(env));
        self
    }

    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        let base = self.sources.take().unwrap_or_else(FlagSources::from_process);
        self.sources = Some(base.with_env_file(path));
        self
    }

    /// Validates the options and creates the service in the `Created` state.
    pub fn build(self) -> Result<Service, ServiceError> {
        if let Some(err) = self.registry_error {
            return Err(err.into());
        }
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        if let Some(server) = &self.http {
            if let Some(existing) = self.registry.get_runnable(server.prefix()) {
                return Err(RegistryError::DuplicatePrefix {
                    prefix: server.prefix().to_string(),
                    existing: existing.name().to_string(),
                }
                .into());
            }
        }

        let env = Flag::new(
            "app-env",
            self.config.env.clone(),
            "Env for service. Ex: dev | stg | prd",
        );
        let shared = Arc::new(Shared {
            name: self.config.name.clone(),
            version: self.config.version.clone(),
            env,
            registry: self.registry,
            http: self.http,
            registered: AtomicBool::new(false),
        });

        tracing::debug!(
            service = %shared.name,
            components = shared.registry.len(),
            http = shared.http.is_some(),
            "Service built"
        );

        Ok(Service::from_parts(
            shared,
            self.sources.unwrap_or_else(FlagSources::from_process),
            self.timeout_override
                .unwrap_or_else(|| self.config.shutdown_timeout()),
            self.config.handle_signals,
        ))
    }

    fn register<R: Runnable>(mut self, prefix: String, component: Arc<R>) -> Self {
        if self.registry_error.is_some() {
            return self;
        }
        if let Err(e) = self.registry.register(prefix, component) {
            tracing::warn!(error = %e, "Component registration rejected");
            self.registry_error = Some(e);
        }
        self
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
