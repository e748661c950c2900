//! Process shutdown on SIGINT / SIGTERM.
//!
//! Cloud Run and Docker both stop containers with SIGTERM; Ctrl+C covers
//! local runs.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resolve once SIGINT or SIGTERM is received, or `token` is cancelled.
///
/// Cancels `token` before returning so that background tasks sharing it
/// stop together with the caller.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
        _ = token.cancelled() => {}
    }

    token.cancel();
}
