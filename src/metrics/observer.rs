use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::domain::{ErrorKind, Outcome, RunSummary, WorkerSummary};
use crate::error::HttpError;

/// Receives engine events at fixed points of a run.
///
/// Every method has an empty default so sinks only implement what they need.
/// Calls come from many worker tasks at once.
pub trait RunObserver: Send + Sync {
    /// A single attempt failed; `backoff` is the delay before the next
    /// attempt, `None` when the retry budget is spent.
    fn on_attempt_failed(
        &self,
        _worker_id: usize,
        _attempt: u32,
        _error: &HttpError,
        _backoff: Option<Duration>,
    ) {
    }

    /// A failure that happened outside the retry loop (client construction,
    /// request build).
    fn on_worker_error(&self, _worker_id: usize, _kind: ErrorKind, _error: &HttpError) {}

    fn on_outcome(&self, _outcome: &Outcome) {}

    fn on_worker_complete(&self, _summary: &WorkerSummary) {}

    fn on_run_complete(&self, _summary: &RunSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Logs engine events through `tracing`, one structured line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_attempt_failed(
        &self,
        worker_id: usize,
        attempt: u32,
        error: &HttpError,
        backoff: Option<Duration>,
    ) {
        let backoff_ms = backoff.map(|delay| u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
        warn!(
            worker_id,
            attempt,
            backoff_ms,
            timed_out = error.is_timeout(),
            error = %error,
            "Retry {} failed",
            attempt
        );
    }

    fn on_worker_error(&self, worker_id: usize, kind: ErrorKind, error: &HttpError) {
        error!(worker_id, kind = kind.as_str(), error = %error, "Worker error");
    }

    fn on_outcome(&self, outcome: &Outcome) {
        match outcome.error_kind {
            None => debug!(
                worker_id = outcome.worker_id,
                request = outcome.request_index,
                attempts = outcome.attempts,
                status = outcome.status,
                latency_ms = outcome.latency_ms,
                "Request succeeded"
            ),
            Some(kind) if is_quiet_failure(kind) => debug!(
                worker_id = outcome.worker_id,
                request = outcome.request_index,
                attempts = outcome.attempts,
                kind = kind.as_str(),
                "{}",
                failure_message(kind)
            ),
            Some(kind) => error!(
                worker_id = outcome.worker_id,
                request = outcome.request_index,
                attempts = outcome.attempts,
                kind = kind.as_str(),
                "{}",
                failure_message(kind)
            ),
        }
    }

    fn on_worker_complete(&self, summary: &WorkerSummary) {
        info!(
            worker_id = summary.worker_id,
            success = summary.success_count,
            failures = summary.failure_count,
            cancelled = summary.cancelled,
            "Worker completed: Success: {}, Failures: {}",
            summary.success_count,
            summary.failure_count
        );
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        info!(
            workers = summary.per_worker.len(),
            success = summary.total_success,
            failures = summary.total_failure,
            elapsed_ms = summary.elapsed_ms,
            cancelled = summary.cancelled,
            "Run complete"
        );
    }
}

/// Outcome kinds logged at debug level instead of error level.
pub(crate) const fn is_quiet_failure(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Cancelled | ErrorKind::ClientConstruction)
}

pub(crate) const fn failure_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ClientConstruction => "Request skipped, worker has no client",
        ErrorKind::RequestBuild => "Request could not be built",
        ErrorKind::TransportFailure => "Request failed after retries",
        ErrorKind::Cancelled => "Request cancelled",
    }
}

/// Fans every event out to several observers in order.
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn RunObserver>>,
}

impl ObserverSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl RunObserver for ObserverSet {
    fn on_attempt_failed(
        &self,
        worker_id: usize,
        attempt: u32,
        error: &HttpError,
        backoff: Option<Duration>,
    ) {
        for observer in &self.observers {
            observer.on_attempt_failed(worker_id, attempt, error, backoff);
        }
    }

    fn on_worker_error(&self, worker_id: usize, kind: ErrorKind, error: &HttpError) {
        for observer in &self.observers {
            observer.on_worker_error(worker_id, kind, error);
        }
    }

    fn on_outcome(&self, outcome: &Outcome) {
        for observer in &self.observers {
            observer.on_outcome(outcome);
        }
    }

    fn on_worker_complete(&self, summary: &WorkerSummary) {
        for observer in &self.observers {
            observer.on_worker_complete(summary);
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        for observer in &self.observers {
            observer.on_run_complete(summary);
        }
    }
}
