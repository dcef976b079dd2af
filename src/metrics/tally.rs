use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::domain::{ErrorKind, Outcome};
use crate::error::HttpError;

use super::observer::RunObserver;

/// Lock-free counters of outcomes by kind, plus failed attempts that were
/// retried.
#[derive(Debug, Default)]
pub struct OutcomeTally {
    success: AtomicU64,
    client_construction: AtomicU64,
    request_build: AtomicU64,
    transport_failure: AtomicU64,
    cancelled: AtomicU64,
    retried_attempts: AtomicU64,
    timed_out_attempts: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TallySnapshot {
    pub success: u64,
    pub client_construction: u64,
    pub request_build: u64,
    pub transport_failure: u64,
    pub cancelled: u64,
    pub retried_attempts: u64,
    pub timed_out_attempts: u64,
}

impl TallySnapshot {
    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.client_construction
            .saturating_add(self.request_build)
            .saturating_add(self.transport_failure)
            .saturating_add(self.cancelled)
    }
}

impl OutcomeTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> TallySnapshot {
        TallySnapshot {
            success: self.success.load(Ordering::Relaxed),
            client_construction: self.client_construction.load(Ordering::Relaxed),
            request_build: self.request_build.load(Ordering::Relaxed),
            transport_failure: self.transport_failure.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            retried_attempts: self.retried_attempts.load(Ordering::Relaxed),
            timed_out_attempts: self.timed_out_attempts.load(Ordering::Relaxed),
        }
    }

    const fn counter(&self, kind: Option<ErrorKind>) -> &AtomicU64 {
        match kind {
            None => &self.success,
            Some(ErrorKind::ClientConstruction) => &self.client_construction,
            Some(ErrorKind::RequestBuild) => &self.request_build,
            Some(ErrorKind::TransportFailure) => &self.transport_failure,
            Some(ErrorKind::Cancelled) => &self.cancelled,
        }
    }
}

impl RunObserver for OutcomeTally {
    fn on_attempt_failed(
        &self,
        _worker_id: usize,
        _attempt: u32,
        error: &HttpError,
        backoff: Option<Duration>,
    ) {
        if backoff.is_some() {
            self.retried_attempts.fetch_add(1, Ordering::Relaxed);
        }
        if error.is_timeout() {
            self.timed_out_attempts.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_outcome(&self, outcome: &Outcome) {
        self.counter(outcome.error_kind)
            .fetch_add(1, Ordering::Relaxed);
    }
}
