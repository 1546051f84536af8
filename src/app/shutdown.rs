//! Ctrl-C handling.

use tokio_util::sync::CancellationToken;

/// Resolves on Ctrl-C. If the signal handler cannot be installed it never
/// resolves, so callers keep running instead of shutting down at once.
pub async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Spawns a task that cancels `token` on Ctrl-C.
///
/// The task exits quietly once `token` is cancelled by someone else.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = wait_for_ctrl_c() => {
                log::warn!("Ctrl-C received, cancelling");
                token.cancel();
            }
        }
    })
}
