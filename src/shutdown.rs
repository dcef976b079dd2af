use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;

pub type ShutdownReceiver = watch::Receiver<bool>;

/// Run-wide shutdown flag.
///
/// Triggering is sticky: a receiver subscribed after `trigger` still reports
/// the run as cancelled.
#[derive(Debug, Clone)]
pub struct ShutdownSender {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownSender {
    /// Marks the run as cancelled. Repeated calls are no-ops.
    pub fn trigger(&self) {
        let _was_triggered = self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> ShutdownReceiver {
        self.tx.subscribe()
    }
}

#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx: Arc::new(tx) }, rx)
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Run was cancelled.")]
pub struct Cancelled;

/// One worker's view of the run-wide shutdown flag.
///
/// Once any check has observed cancellation the signal stays fired without
/// touching the channel again. Dropping every sender counts as cancellation.
#[derive(Debug)]
pub struct CancelSignal {
    rx: ShutdownReceiver,
    fired: bool,
}

impl CancelSignal {
    #[must_use]
    pub const fn new(rx: ShutdownReceiver) -> Self {
        Self { rx, fired: false }
    }

    #[must_use]
    pub fn subscribe(shutdown_tx: &ShutdownSender) -> Self {
        Self::new(shutdown_tx.subscribe())
    }

    pub fn is_cancelled(&mut self) -> bool {
        if !self.fired {
            let triggered = *self.rx.borrow();
            self.fired = triggered || self.rx.has_changed().is_err();
        }
        self.fired
    }

    /// Resolves once the run is cancelled, including when it already was.
    pub async fn cancelled(&mut self) {
        if self.fired {
            return;
        }
        drop(self.rx.wait_for(|triggered| *triggered).await);
        self.fired = true;
    }

    /// Sleeps for `delay` unless cancellation arrives first.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] when the run is cancelled before or during the sleep.
    pub async fn sleep(&mut self, delay: Duration) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            () = self.cancelled() => Err(Cancelled),
            () = sleep(delay) => Ok(()),
        }
    }
}
