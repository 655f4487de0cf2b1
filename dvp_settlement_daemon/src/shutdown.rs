use log::*;
use tokio_util::sync::CancellationToken;

/// Installs the process signal handlers and returns a token that is cancelled on the first
/// `ctrl-c` (or SIGTERM on unix). The coordinator checks the token between rows, finishes the
/// in-flight transition, and exits; nothing is ever left half-committed.
pub fn listen_for_shutdown() -> Result<CancellationToken, std::io::Error> {
    let token = CancellationToken::new();
    let shutdown = token.clone();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("🛑️ ctrl-c received"),
                _ = sigterm.recv() => info!("🛑️ SIGTERM received"),
            }
            shutdown.cancel();
        });
    }
    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("🛑️ ctrl-c received");
            }
            shutdown.cancel();
        });
    }
    Ok(token)
}
