//! Service configuration.
//!
//! # Data Flow
//! ```text
//! service.toml (optional)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig
//!     → ServiceBuilder::config(..), then individual builder options override it
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a minimal (or no) file works
//! - Validation returns every problem, not just the first
//! - Per-component parameters never live here; they go through the flag set

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ServiceConfig;
pub use validation::{validate_config, ValidationError};
