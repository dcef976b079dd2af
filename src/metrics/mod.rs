//! Run observers: structured logging, in-memory outcome tallies and latency
//! percentiles, plus an optional HTTP endpoint that serves them live.
mod diagnostics;
mod latency;
mod observer;
mod tally;

#[cfg(test)]
mod tests;

pub use diagnostics::{DIAGNOSTICS_PATH, DiagnosticsServer, DiagnosticsSnapshot};
pub use latency::{LatencyRecorder, LatencySnapshot};
pub use observer::{NoopObserver, ObserverSet, RunObserver, TracingObserver};
pub use tally::{OutcomeTally, TallySnapshot};
