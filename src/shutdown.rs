//! SIGINT/SIGTERM handling.

use std::io;

use log::info;
use tokio::{
    signal::unix::{SignalKind, signal},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// Installs the signal handlers and spawns a task that cancels `token` on
/// the first SIGINT or SIGTERM.
///
/// Handlers are registered before returning, so a signal delivered right
/// after this call is not lost.
pub fn listen(token: CancellationToken) -> io::Result<JoinHandle<()>> {
    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = int.recv() => info!("Received SIGINT, initiating graceful shutdown..."),
            _ = term.recv() => info!("Received SIGTERM, initiating graceful shutdown..."),
            _ = token.cancelled() => return,
        }
        token.cancel();
    }))
}
