//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Service / components produce:
//!     → tracing events and spans (ServiceContext::logger(prefix))
//!     → metrics.rs (lifecycle counters and state gauge)
//!
//! Consumers:
//!     → logging.rs installs a fmt subscriber for binaries
//!     → any `metrics` recorder the application installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder on its own
//! - Metric names are stable; labels carry component prefix and outcome

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
