use std::time::Duration;

use tokio_util::task::TaskTracker;

/// How long accepted bookings get to finish their contact linking and outbox writes
/// once the server stopped taking requests.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves on Ctrl+C or SIGTERM.
///
/// # Panics
///
/// Panics if the Ctrl+C or SIGTERM signal handler cannot be installed.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Ctrl+C pressed, no longer accepting bookings"),
        () = terminate => tracing::info!("Received SIGTERM, no longer accepting bookings"),
    }
}

/// Closes `tracker` and waits up to `timeout` for its tasks.
///
/// Returns `false` when tasks were still running at the deadline; they are abandoned.
pub async fn drain_background_tasks(tracker: &TaskTracker, timeout: Duration) -> bool {
    tracker.close();
    let pending = tracker.len();
    if pending > 0 {
        tracing::info!(pending, "Waiting for background booking tasks to finish");
    }

    match tokio::time::timeout(timeout, tracker.wait()).await {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(
                pending = tracker.len(),
                "Shutdown timeout reached, abandoning background booking tasks"
            );
            false
        }
    }
}
