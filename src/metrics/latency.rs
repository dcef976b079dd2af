use std::sync::Mutex;

use hdrhistogram::Histogram;
use serde::Serialize;
use tracing::warn;

use crate::domain::Outcome;
use crate::error::{AppResult, MetricsError};

use super::observer::RunObserver;

/// Significant figures kept by the latency histogram.
const HISTOGRAM_SIGFIGS: u8 = 3;

/// Latency distribution of successful requests, in milliseconds.
#[derive(Debug)]
pub struct LatencyRecorder {
    hist: Mutex<Histogram<u64>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatencySnapshot {
    pub count: u64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
}

impl LatencyRecorder {
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub fn new() -> AppResult<Self> {
        let hist = Histogram::<u64>::new(HISTOGRAM_SIGFIGS).map_err(|err| {
            MetricsError::Histogram {
                context: "create latency histogram",
                source: err,
            }
        })?;
        Ok(Self {
            hist: Mutex::new(hist),
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> LatencySnapshot {
        let Ok(hist) = self.hist.lock() else {
            return LatencySnapshot::default();
        };
        if hist.len() == 0 {
            return LatencySnapshot::default();
        }
        LatencySnapshot {
            count: hist.len(),
            p50_ms: hist.value_at_quantile(0.5),
            p90_ms: hist.value_at_quantile(0.9),
            p99_ms: hist.value_at_quantile(0.99),
            max_ms: hist.max(),
        }
    }
}

impl RunObserver for LatencyRecorder {
    fn on_outcome(&self, outcome: &Outcome) {
        if !outcome.succeeded {
            return;
        }
        match self.hist.lock() {
            Ok(mut hist) => hist.saturating_record(outcome.latency_ms.max(1)),
            Err(err) => warn!("Latency histogram unavailable: {}", err),
        }
    }
}
