//! Component lifecycle orchestration for long-running services.
//!
//! Components implement [`Runnable`], register with a [`ServiceBuilder`], and
//! are driven through flag resolution, configuration, concurrent run, and a
//! concurrent stop fan-out by the resulting [`Service`].

pub mod component;
pub mod config;
pub mod flags;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod service;
pub mod worker;

pub use component::{ComponentError, HasPrefix, Lifeline, Retrievable, Runnable, StopSignal};
pub use config::{load_config, ConfigError, ServiceConfig};
pub use flags::{EnvSource, Flag, FlagError, FlagSet, FlagSources, FlagValue};
pub use http::HttpServer;
pub use lifecycle::{LifecycleState, Shutdown};
pub use observability::init_tracing;
pub use registry::{LookupError, Registry, RegistryError};
pub use service::{Service, ServiceBuilder, ServiceContext, ServiceError};
pub use worker::WorkerFn;
