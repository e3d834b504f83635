//! Embedded HTTP server component.
//!
//! # Data Flow
//! ```text
//! HttpServer::add_handler(f)        (before or during configure)
//!     → run(): Router::new() + /ping + /status
//!            → f1(router) → f2(router) ...
//!            → TimeoutLayer, TraceLayer
//!            → axum::serve(listener) until the lifeline is cancelled
//! ```
//!
//! # Design Decisions
//! - The server is an ordinary `Runnable`; the service only starts it first
//! - Handlers are plain `Fn(Router) -> Router` callbacks so each component
//!   mounts its own routes
//! - Port `0` binds an ephemeral port; `uri()` reports the real one once bound

pub mod handlers;
pub mod server;

pub use server::{HttpServer, HttpServerHandler};
