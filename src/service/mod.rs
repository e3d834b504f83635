//! Lifecycle orchestrator.
//!
//! # Data Flow
//! ```text
//! ServiceBuilder (options) → Registry + ServiceConfig + optional HttpServer
//!     → Service (Created)
//!     → init():  init_flags all → parse → configure each in order
//!     → start(): run all concurrently → first terminal signal → stop()
//!     → stop():  stop all concurrently → await every StopSignal
//!
//! ServiceContext (shared with components):
//!     name / version / env / logger(prefix) / get / must_get / http_server
//! ```
//!
//! # Design Decisions
//! - Configure is sequential so one component may read another's configured value
//! - Run and stop are fanned out; a slow component never delays signalling others
//! - First run error wins; later errors during shutdown are only logged
//! - Stop happens once per service no matter how many callers ask for it

pub mod builder;
pub mod context;
pub mod error;
#[allow(clippy::module_inception)]
pub mod service;

pub use builder::ServiceBuilder;
pub use context::ServiceContext;
pub use error::ServiceError;
pub use service::Service;
