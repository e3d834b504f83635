//! HTTP server component built on axum.
//!
//! # Responsibilities
//! - Register host/port/timeout flags under the server's prefix
//! - Collect route registration callbacks from other components
//! - Bind, serve, and shut down gracefully when stopped

use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axum::{routing::get, Json, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::component::{ComponentError, HasPrefix, Lifeline, Retrievable, Runnable, StopSignal};
use crate::flags::{Flag, FlagSet};
use crate::http::handlers::{ping, ServiceStatus};
use crate::service::ServiceContext;

/// Route registration callback.
pub type HttpServerHandler = Box<dyn Fn(Router) -> Router + Send + Sync>;

/// HTTP server for the service's REST surface.
pub struct HttpServer {
    prefix: String,
    host: Flag<String>,
    port: Flag<u16>,
    request_timeout_secs: Flag<u64>,
    handlers: Mutex<Vec<HttpServerHandler>>,
    bound: ArcSwapOption<SocketAddr>,
    lifeline: Lifeline,
}

impl std::fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServer")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl HttpServer {
    /// Creates a server whose flags are named `{prefix}-host`, `{prefix}-port`,
    /// and `{prefix}-request-timeout-secs`.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            host: Flag::prefixed(&prefix, "host", "0.0.0.0".to_string(), "HTTP listen host"),
            port: Flag::prefixed(&prefix, "port", 3000, "HTTP listen port (0 picks a free port)"),
            request_timeout_secs: Flag::prefixed(
                &prefix,
                "request-timeout-secs",
                30,
                "HTTP request timeout in seconds",
            ),
            prefix,
            handlers: Mutex::new(Vec::new()),
            bound: ArcSwapOption::empty(),
            lifeline: Lifeline::new(),
        }
    }

    /// Builder-style [`HttpServer::add_handler`].
    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(Router) -> Router + Send + Sync + 'static,
    {
        self.add_handler(handler);
        self
    }

    /// Adds a route registration callback, applied in order when the server runs.
    pub fn add_handler<F>(&self, handler: F)
    where
        F: Fn(Router) -> Router + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(handler));
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Address the server listens on: the bound socket once running, the
    /// configured `host:port` before that.
    pub fn uri(&self) -> String {
        match self.local_addr() {
            Some(addr) => addr.to_string(),
            None => format!("{}:{}", self.host.get(), self.port.get()),
        }
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.bound.load_full().map(|addr| *addr)
    }

    /// Flag handles, so callers can override values before `init`.
    pub fn port_flag(&self) -> &Flag<u16> {
        &self.port
    }

    pub fn host_flag(&self) -> &Flag<String> {
        &self.host
    }

    /// Build the Axum router with all registered handlers and middleware layers.
    #[allow(deprecated)]
    fn build_router(&self, ctx: &ServiceContext) -> Router {
        let status = ServiceStatus {
            name: ctx.name().to_string(),
            version: ctx.version().to_string(),
            env: ctx.env(),
        };

        let mut router = Router::new().route("/ping", get(ping)).route(
            "/status",
            get(move || {
                let status = status.clone();
                async move { Json(status) }
            }),
        );

        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        for handler in handlers.iter() {
            router = handler(router);
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.request_timeout_secs.get(),
            )))
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Runnable for HttpServer {
    fn name(&self) -> &str {
        "http-server"
    }

    fn init_flags(&self, flags: &mut FlagSet) {
        flags.register(&self.host);
        flags.register(&self.port);
        flags.register(&self.request_timeout_secs);
    }

    async fn configure(&self, _ctx: &ServiceContext) -> Result<(), ComponentError> {
        if self.host.get().trim().is_empty() {
            return Err(ComponentError::MissingParameter(self.host.name().to_string()));
        }
        if self.request_timeout_secs.get() == 0 {
            return Err(ComponentError::InvalidParameter {
                name: self.request_timeout_secs.name().to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    async fn run(&self, ctx: &ServiceContext) -> Result<(), ComponentError> {
        let _running = self.lifeline.enter();
        if self.lifeline.is_cancelled() {
            return Ok(());
        }

        let host = self.host.get();
        let port = self.port.get();
        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|e| ComponentError::Unavailable(format!("cannot bind {host}:{port}: {e}")))?;
        let addr = listener.local_addr()?;
        self.bound.store(Some(std::sync::Arc::new(addr)));

        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.build_router(ctx);
        let token = self.lifeline.token();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;

        tracing::info!(address = %addr, "HTTP server stopped");
        Ok(())
    }

    fn stop(&self) -> StopSignal {
        self.lifeline.stop()
    }
}

impl HasPrefix for HttpServer {
    fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Retrievable for HttpServer {
    type Target = SocketAddr;

    fn get(&self) -> Option<SocketAddr> {
        self.local_addr()
    }
}
