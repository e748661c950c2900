//! Stop the emitter on SIGINT / SIGTERM.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel `token` on the first SIGINT or SIGTERM. Returns early, without
/// waiting for a signal, if `token` is cancelled elsewhere.
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        name = terminated() => {
            info!(signal = name, "stopping emitter");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

/// Resolve with the name of the first termination signal received.
/// Never resolves if no handler can be installed.
async fn terminated() -> &'static str {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let term = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let term = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c => name,
        name = term => name,
    }
}
