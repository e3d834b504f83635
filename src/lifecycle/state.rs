//! Orchestrator lifecycle states.

use std::fmt;

/// Where a [`Service`](crate::Service) is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Built, not yet initialized.
    Created,
    /// Flags resolved and every component configured.
    Initialized,
    /// Component run tasks are live.
    Running,
    /// Stop fan-out in progress.
    Stopping,
    /// Every component acknowledged stop.
    Stopped,
    /// Init or a component run failed. Absorbing.
    Failed,
}

impl LifecycleState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Initialized => "initialized",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Failed => "failed",
        }
    }

    /// Numeric code exported as the lifecycle gauge.
    pub fn as_code(&self) -> u8 {
        match self {
            LifecycleState::Created => 0,
            LifecycleState::Initialized => 1,
            LifecycleState::Running => 2,
            LifecycleState::Stopping => 3,
            LifecycleState::Stopped => 4,
            LifecycleState::Failed => 5,
        }
    }

    /// `Stopped` and `Failed` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
