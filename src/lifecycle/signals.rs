//! OS signal handling.
//!
//! # Signals
//! - Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`
//! - Elsewhere: Ctrl-C via [`tokio::signal::ctrl_c`]

/// Waits for a termination signal.
///
/// Returns `Err` if the listeners cannot be installed.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::info!(signal = name, "Shutdown signal received");
    Ok(())
}

/// Waits for a termination signal.
///
/// Returns `Err` if the listener cannot be installed.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl_c", "Shutdown signal received");
    Ok(())
}
