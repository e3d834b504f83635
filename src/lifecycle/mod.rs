//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! State (state.rs):
//!     Created → Initialized → Running → Stopping → Stopped
//!                    └──────────┴──→ Failed (absorbing)
//!
//! Shutdown (shutdown.rs):
//!     Shutdown::trigger() / Service::stop() / OS signal → start() stops waiting
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere) → shutdown request
//! ```
//!
//! # Design Decisions
//! - A shutdown request is level-triggered: requesting before `start` still counts
//! - There is no per-component cancellation, only whole-service shutdown
//! - Signal listening is optional so tests can run without it

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::Shutdown;
pub use state::LifecycleState;
