use volley::shutdown::{CancelSignal, ShutdownSender};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

/// Forwards Ctrl+C and SIGTERM to the run's shutdown flag.
///
/// The task also ends when anything else triggers `shutdown_tx`, so the
/// caller stops it by triggering once the run is over.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    let mut shutdown_rx = CancelSignal::subscribe(&shutdown_tx);
    tokio::spawn(async move {
        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                () = shutdown_rx.cancelled() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, stopping workers");
                    shutdown_tx.trigger();
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    info!("SIGTERM received, stopping workers");
                    shutdown_tx.trigger();
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                () = shutdown_rx.cancelled() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl+C received, stopping workers");
                    shutdown_tx.trigger();
                }
            }
        }
    })
}
