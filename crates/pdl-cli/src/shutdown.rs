//! Signal handling.

use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_SHUTDOWN;

/// Cancels `token` on the first SIGINT or SIGTERM.
///
/// Returns immediately; the listener runs on its own task and exits with the
/// token, so a run that finishes first leaves nothing behind.
pub fn cancel_on_signal(token: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            () = wait_for_signal() => {
                tracing::warn!(
                    target: TRACING_TARGET_SHUTDOWN,
                    "Shutdown requested, stopping after in-flight items"
                );
                token.cancel();
            }
            () = token.cancelled() => {}
        }
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %err,
                "Failed to install Ctrl+C handler"
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %err,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
