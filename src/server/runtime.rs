use super::types::ShutdownReason;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

/// Block until SIGINT or SIGTERM arrives
pub async fn wait_for_shutdown_signal() -> ShutdownReason {
    let (shutdown_sender, shutdown_receiver) = oneshot::channel();
    setup_signal_handlers(shutdown_sender);

    match shutdown_receiver.await {
        Ok(reason) => {
            info!("Shutdown initiated: {:?}", reason);
            reason
        }
        Err(_) => {
            warn!("Shutdown channel closed unexpectedly");
            ShutdownReason::Error("shutdown channel closed".to_string())
        }
    }
}

/// Set up signal handlers for graceful shutdown
fn setup_signal_handlers(shutdown_sender: oneshot::Sender<ShutdownReason>) {
    let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

    // Handle SIGTERM (supervisor stop) - Unix only
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    warn!("Failed to register SIGTERM handler: {}", e);
                    return;
                }
            };
            if let Some(()) = sigterm.recv().await {
                info!("Received SIGTERM signal");
                if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                }
            }
        });
    }

    // Handle SIGINT (Ctrl+C) - Cross-platform
    let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
            }
        }
    });
}
