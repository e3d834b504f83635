//! Component capability contract.
//!
//! # Data Flow
//! ```text
//! caller builds component (flags declared as Flag<T> handles)
//!     → init_flags(&mut FlagSet)   register parameters
//!     → configure(&ServiceContext) validate / connect
//!     → run(&ServiceContext)       duty cycle (own task)
//!     → stop() -> StopSignal       one-shot teardown completion
//! ```
//!
//! # Design Decisions
//! - Every method takes `&self`; components are shared through `Arc` between the
//!   registry and their run task, so mutable state lives behind interior mutability
//! - `StopSignal` is consumed when awaited, so it can only be observed once
//! - `Lifeline` packages the cancel/running bookkeeping most components need

pub mod error;
pub mod runnable;
pub mod stop;

pub use error::ComponentError;
pub use runnable::{HasPrefix, Retrievable, Runnable};
pub use stop::{Lifeline, RunningGuard, StopSignal};
