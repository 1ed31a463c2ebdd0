use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            res = tokio::signal::ctrl_c() => res?,
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

/// Cancel `cancel` once a shutdown signal arrives.
pub fn cancel_on_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(()) => tracing::info!("shutdown: signal received"),
            Err(e) => {
                tracing::warn!(error = %e, "shutdown: signal listener failed; waiting for ctrl_c()");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        cancel.cancel();
    });
}
