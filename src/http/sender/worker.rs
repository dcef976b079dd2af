use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use crate::domain::{ErrorKind, Outcome, RunConfig, WorkerSummary};
use crate::error::RetryError;
use crate::metrics::RunObserver;
use crate::shutdown::CancelSignal;

use super::super::fingerprint::{RequestFingerprinter, UserAgentPool};
use super::super::rate::RateLimiter;
use super::super::retry::{RetryPolicy, execute_with_retry};
use super::super::transport::{TransportFactory, build_request};

/// Shortest pause between two requests of one worker.
pub(crate) const PACING_MIN: Duration = Duration::from_millis(10);
/// Longest pause between two requests of one worker.
pub(crate) const PACING_MAX: Duration = Duration::from_millis(50);

/// Everything a worker borrows from the dispatcher for the length of a run.
pub(super) struct WorkerContext<'ctx, F: TransportFactory> {
    pub(super) worker_id: usize,
    pub(super) config: &'ctx RunConfig,
    pub(super) limiter: &'ctx RateLimiter,
    pub(super) factory: &'ctx F,
    pub(super) user_agents: &'ctx UserAgentPool,
    pub(super) observer: &'ctx dyn RunObserver,
}

pub(crate) fn pacing_delay<R: Rng>(rng: &mut R) -> Duration {
    rng.gen_range(PACING_MIN..=PACING_MAX)
}

/// Drives one worker until its quota is spent or the run is cancelled.
pub(super) async fn run_worker<F: TransportFactory>(
    context: &WorkerContext<'_, F>,
    cancel: &mut CancelSignal,
) -> WorkerSummary {
    let worker_id = context.worker_id;
    let planned = context.config.requests_per_worker().get();
    let mut summary = WorkerSummary::new(worker_id);

    let transport = match context.factory.create_transport() {
        Ok(transport) => transport,
        Err(err) => {
            context
                .observer
                .on_worker_error(worker_id, ErrorKind::ClientConstruction, &err);
            for request_index in 0..planned {
                let outcome = Outcome::failure(
                    worker_id,
                    request_index,
                    0,
                    ErrorKind::ClientConstruction,
                    Duration::ZERO,
                );
                record(context.observer, &mut summary, &outcome);
            }
            context.observer.on_worker_complete(&summary);
            return summary;
        }
    };

    let mut fingerprinter = RequestFingerprinter::new(context.user_agents.clone());
    let mut pacing_rng = SmallRng::from_entropy();
    let policy = RetryPolicy::standard();

    for request_index in 0..planned {
        if context.limiter.acquire(cancel).await.is_err() {
            let outcome = Outcome::failure(
                worker_id,
                request_index,
                0,
                ErrorKind::Cancelled,
                Duration::ZERO,
            );
            record(context.observer, &mut summary, &outcome);
            summary.cancelled = true;
            break;
        }

        let start = Instant::now();
        let mut request = match build_request(context.config.target()) {
            Ok(request) => request,
            Err(err) => {
                context
                    .observer
                    .on_worker_error(worker_id, ErrorKind::RequestBuild, &err);
                let outcome = Outcome::failure(
                    worker_id,
                    request_index,
                    0,
                    ErrorKind::RequestBuild,
                    start.elapsed(),
                );
                record(context.observer, &mut summary, &outcome);
                continue;
            }
        };
        fingerprinter.apply(&mut request);

        let result = execute_with_retry(
            &transport,
            &request,
            policy,
            cancel,
            |attempt, err, backoff| {
                context
                    .observer
                    .on_attempt_failed(worker_id, attempt, err, backoff);
            },
        )
        .await;

        let outcome = match result {
            Ok(success) => Outcome::success(
                worker_id,
                request_index,
                success.attempts,
                success.response.status,
                start.elapsed(),
            ),
            Err(err) => {
                let kind = match &err {
                    RetryError::Exhausted { .. } => ErrorKind::TransportFailure,
                    RetryError::Cancelled { .. } => ErrorKind::Cancelled,
                    RetryError::Prepare { source, .. } => {
                        context
                            .observer
                            .on_worker_error(worker_id, ErrorKind::RequestBuild, source);
                        ErrorKind::RequestBuild
                    }
                };
                Outcome::failure(
                    worker_id,
                    request_index,
                    err.attempts(),
                    kind,
                    start.elapsed(),
                )
            }
        };
        let stop = outcome.error_kind == Some(ErrorKind::Cancelled);
        record(context.observer, &mut summary, &outcome);
        if stop {
            summary.cancelled = true;
            break;
        }

        let is_last = request_index.saturating_add(1) >= planned;
        if !is_last && cancel.sleep(pacing_delay(&mut pacing_rng)).await.is_err() {
            summary.cancelled = true;
            break;
        }
    }

    drop(transport);
    context.observer.on_worker_complete(&summary);
    summary
}

fn record(observer: &dyn RunObserver, summary: &mut WorkerSummary, outcome: &Outcome) {
    summary.record(outcome);
    observer.on_outcome(outcome);
}
