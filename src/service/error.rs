//! Errors surfaced by the orchestrator.

use std::time::Duration;

use thiserror::Error;

use crate::component::ComponentError;
use crate::config::ConfigError;
use crate::flags::FlagError;
use crate::lifecycle::LifecycleState;
use crate::registry::RegistryError;

/// # Errors produced by a [`Service`](crate::Service).
///
/// Configure and run failures always name the component they came from.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A lifecycle method was called in the wrong state.
    #[error("cannot {operation} while service is {state}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },

    /// Registration was rejected while building.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The service configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Flags could not be resolved.
    #[error("flags: {0}")]
    Flags(#[from] FlagError),

    /// A component failed to configure; later components were left unconfigured.
    #[error("configure `{prefix}` ({name}): {source}")]
    Configure {
        name: String,
        prefix: String,
        #[source]
        source: ComponentError,
    },

    /// A component's run returned an error; the service was stopped.
    #[error("run `{prefix}` ({name}): {source}")]
    Run {
        name: String,
        prefix: String,
        #[source]
        source: ComponentError,
    },

    /// A component panicked in `configure` or `run`.
    #[error("{phase} `{prefix}` ({name}) panicked: {message}")]
    Panicked {
        /// `"configure"` or `"run"`.
        phase: &'static str,
        name: String,
        prefix: String,
        message: String,
    },

    /// The parameter dump could not be written.
    #[error("write env: {0}")]
    Io(#[from] std::io::Error),

    /// Some components did not acknowledge stop within the deadline.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded { grace: Duration, stuck: Vec<String> },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::InvalidState { .. } => "service_invalid_state",
            ServiceError::Registry(_) => "service_registry",
            ServiceError::Config(_) => "service_config",
            ServiceError::Flags(_) => "service_flags",
            ServiceError::Configure { .. } => "component_configure",
            ServiceError::Run { .. } => "component_run",
            ServiceError::Panicked { .. } => "component_panicked",
            ServiceError::GraceExceeded { .. } => "service_grace_exceeded",
            ServiceError::Io(_) => "service_io",
        }
    }

    /// Prefix of the component responsible, when there is one.
    pub fn component(&self) -> Option<&str> {
        match self {
            ServiceError::Configure { prefix, .. }
            | ServiceError::Run { prefix, .. }
            | ServiceError::Panicked { prefix, .. } => Some(prefix),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_error_names_component() {
        let err = ServiceError::Configure {
            name: "redis".into(),
            prefix: "b".into(),
            source: ComponentError::MissingParameter("b-uri".into()),
        };
        assert_eq!(err.component(), Some("b"));
        assert_eq!(err.as_label(), "component_configure");
        assert_eq!(
            err.to_string(),
            "configure `b` (redis): missing required parameter `b-uri`"
        );
    }

    #[test]
    fn invalid_state_message() {
        let err = ServiceError::InvalidState {
            operation: "start",
            state: LifecycleState::Created,
        };
        assert_eq!(err.to_string(), "cannot start while service is created");
        assert_eq!(err.component(), None);
    }
}
