//! OS signal handling.
//!
//! - SIGINT / SIGTERM trigger shutdown
//! - SIGHUP triggers a configuration reload, not shutdown
//!
//! Non-unix platforms only get Ctrl+C.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ReloadTrigger;
use crate::lifecycle::Shutdown;

/// Spawn the task translating process signals into shutdown and reload.
pub fn spawn_signal_handler(
    shutdown: Shutdown,
    reload_tx: mpsc::UnboundedSender<ReloadTrigger>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = listen(&shutdown, &reload_tx).await {
            tracing::error!(error = %e, "Failed to install signal handlers, falling back to Ctrl+C");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
        }
        tracing::info!("Shutdown signal received");
        shutdown.trigger();
    })
}

#[cfg(unix)]
async fn listen(
    shutdown: &Shutdown,
    reload_tx: &mpsc::UnboundedSender<ReloadTrigger>,
) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            _ = interrupt.recv() => return Ok(()),
            _ = terminate.recv() => return Ok(()),
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading configuration");
                let _ = reload_tx.send(ReloadTrigger);
            }
            _ = shutdown.wait() => return Ok(()),
        }
    }
}

#[cfg(not(unix))]
async fn listen(
    shutdown: &Shutdown,
    _reload_tx: &mpsc::UnboundedSender<ReloadTrigger>,
) -> std::io::Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = shutdown.wait() => Ok(()),
    }
}
