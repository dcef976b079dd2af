use std::time::Duration;

use serde::Serialize;

/// Why a logical request ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ClientConstruction,
    RequestBuild,
    TransportFailure,
    Cancelled,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ClientConstruction => "client_construction",
            ErrorKind::RequestBuild => "request_build",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Result of one logical request, after retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub worker_id: usize,
    pub request_index: u64,
    pub succeeded: bool,
    pub attempts: u32,
    pub error_kind: Option<ErrorKind>,
    pub status: Option<u16>,
    pub latency_ms: u64,
}

impl Outcome {
    #[must_use]
    pub fn success(
        worker_id: usize,
        request_index: u64,
        attempts: u32,
        status: u16,
        latency: Duration,
    ) -> Self {
        Self {
            worker_id,
            request_index,
            succeeded: true,
            attempts,
            error_kind: None,
            status: Some(status),
            latency_ms: duration_ms(latency),
        }
    }

    #[must_use]
    pub fn failure(
        worker_id: usize,
        request_index: u64,
        attempts: u32,
        kind: ErrorKind,
        latency: Duration,
    ) -> Self {
        Self {
            worker_id,
            request_index,
            succeeded: false,
            attempts,
            error_kind: Some(kind),
            status: None,
            latency_ms: duration_ms(latency),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub success_count: u64,
    pub failure_count: u64,
    /// Set when the worker stopped early because the run was cancelled.
    pub cancelled: bool,
}

impl WorkerSummary {
    #[must_use]
    pub const fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            success_count: 0,
            failure_count: 0,
            cancelled: false,
        }
    }

    pub const fn record(&mut self, outcome: &Outcome) {
        if outcome.succeeded {
            self.success_count = self.success_count.saturating_add(1);
        } else {
            self.failure_count = self.failure_count.saturating_add(1);
        }
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.success_count.saturating_add(self.failure_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub per_worker: Vec<WorkerSummary>,
    pub total_success: u64,
    pub total_failure: u64,
    pub elapsed_ms: u64,
    pub cancelled: bool,
}

impl RunSummary {
    #[must_use]
    pub fn from_workers(per_worker: Vec<WorkerSummary>, elapsed: Duration) -> Self {
        let mut total_success: u64 = 0;
        let mut total_failure: u64 = 0;
        let mut cancelled = false;
        for worker in &per_worker {
            total_success = total_success.saturating_add(worker.success_count);
            total_failure = total_failure.saturating_add(worker.failure_count);
            cancelled |= worker.cancelled;
        }
        Self {
            per_worker,
            total_success,
            total_failure,
            elapsed_ms: duration_ms(elapsed),
            cancelled,
        }
    }

    #[must_use]
    pub const fn total_requests(&self) -> u64 {
        self.total_success.saturating_add(self.total_failure)
    }

    /// Success rate in hundredths of a percent.
    #[must_use]
    pub fn success_rate_x100(&self) -> u64 {
        self.total_success
            .saturating_mul(10_000)
            .checked_div(self.total_requests())
            .unwrap_or(0)
    }

    /// Completed requests per second in hundredths.
    #[must_use]
    pub fn throughput_x100(&self) -> u64 {
        self.total_requests()
            .saturating_mul(100_000)
            .checked_div(self.elapsed_ms)
            .unwrap_or(0)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
