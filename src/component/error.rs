//! Errors raised by components from `configure` and `run`.

use thiserror::Error;

/// Boxed error accepted from third-party clients a component wraps.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a single component.
///
/// The orchestrator attaches the component name and prefix when it propagates
/// one of these, so the variants only describe what went wrong.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ComponentError {
    /// A parameter the component cannot work without was left empty.
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),

    /// A parameter was present but unusable.
    #[error("invalid value for parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Flag name as registered.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A remote endpoint or local resource could not be reached.
    #[error("resource unavailable: {0}")]
    Unavailable(String),

    /// The component gave up for a reason of its own.
    #[error(transparent)]
    Other(#[from] BoxError),
}

impl ComponentError {
    /// Wraps any error type as [`ComponentError::Other`].
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ComponentError::Other(Box::new(err))
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::MissingParameter(_) => "missing_parameter",
            ComponentError::InvalidParameter { .. } => "invalid_parameter",
            ComponentError::Unavailable(_) => "unavailable",
            ComponentError::Other(_) => "component_error",
        }
    }
}

impl From<std::io::Error> for ComponentError {
    fn from(err: std::io::Error) -> Self {
        ComponentError::Other(Box::new(err))
    }
}
