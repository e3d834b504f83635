//! Process parameter surface.
//!
//! # Data Flow
//! ```text
//! component constructor → Flag<T> handles (name, help, default)
//!     → Runnable::init_flags(&mut FlagSet)   register handles
//!     → FlagSet::parse(&FlagSources)
//!           per flag: --cli-arg > process env > env file > default
//!     → components read Flag<T>::get() in configure/run
//!
//! OutEnv:
//!     FlagSet::render_env() → "REDIS_URI=redis://..." one line per flag
//! ```
//!
//! # Design Decisions
//! - The set is passed explicitly to `init_flags`; there is no global namespace
//! - Env names derive from flag names: upper-case, `-` and `.` become `_`
//! - Duplicate names are collected at registration and reported by `parse`
//! - A missing env file is not an error

pub mod env;
pub mod flag;
pub mod set;

pub use env::{env_key, EnvSource};
pub use flag::{Flag, FlagValue};
pub use set::{FlagError, FlagSet, FlagSources};
