mod worker;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::{
    domain::{RunConfig, RunSummary, WorkerSummary},
    error::{AppError, AppResult},
    metrics::{NoopObserver, RunObserver},
    shutdown::{CancelSignal, ShutdownSender, shutdown_channel},
};

use super::fingerprint::UserAgentPool;
use super::rate::RateLimiter;
use super::transport::TransportFactory;
use worker::{WorkerContext, run_worker};

#[cfg(test)]
pub(crate) use worker::{PACING_MAX, PACING_MIN, pacing_delay};

/// Owns the worker pool for one run.
///
/// Each worker gets its own transport from the factory; the rate limiter is
/// the only state the workers share.
pub struct Dispatcher<F: TransportFactory> {
    factory: Arc<F>,
    user_agents: UserAgentPool,
    observer: Arc<dyn RunObserver>,
}

impl<F: TransportFactory> Dispatcher<F> {
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            user_agents: UserAgentPool::builtin(),
            observer: Arc::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_user_agents(mut self, user_agents: UserAgentPool) -> Self {
        self.user_agents = user_agents;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Runs every worker to completion.
    ///
    /// # Errors
    ///
    /// Returns an error when a worker task panics or is aborted.
    pub async fn run(&self, config: &RunConfig) -> AppResult<RunSummary> {
        let (shutdown_tx, _shutdown_rx) = shutdown_channel();
        self.run_with_shutdown(config, &shutdown_tx).await
    }

    /// Runs every worker until its quota is spent or `shutdown_tx` fires.
    ///
    /// # Errors
    ///
    /// Returns an error when a worker task panics or is aborted.
    pub async fn run_with_shutdown(
        &self,
        config: &RunConfig,
        shutdown_tx: &ShutdownSender,
    ) -> AppResult<RunSummary> {
        let start = Instant::now();
        let limiter = Arc::new(RateLimiter::new(config.rate_per_second()));
        let worker_count = config.worker_count().get();
        debug!(
            workers = worker_count,
            requests_per_worker = config.requests_per_worker().get(),
            rate = config.rate_per_second().get(),
            "Starting workers"
        );

        let mut handles: Vec<JoinHandle<WorkerSummary>> = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            // The flag is sticky, so a trigger that lands before this
            // subscribe is still seen by the worker.
            let mut cancel = CancelSignal::subscribe(shutdown_tx);
            let config = config.clone();
            let limiter = Arc::clone(&limiter);
            let factory = Arc::clone(&self.factory);
            let user_agents = self.user_agents.clone();
            let observer = Arc::clone(&self.observer);
            handles.push(tokio::spawn(async move {
                let context = WorkerContext {
                    worker_id,
                    config: &config,
                    limiter: &limiter,
                    factory: factory.as_ref(),
                    user_agents: &user_agents,
                    observer: observer.as_ref(),
                };
                run_worker(&context, &mut cancel).await
            }));
        }

        let mut per_worker = Vec::with_capacity(worker_count);
        let mut join_error = None;
        for handle in handles {
            match handle.await {
                Ok(summary) => per_worker.push(summary),
                Err(err) => {
                    error!("Worker task failed: {}", err);
                    if join_error.is_none() {
                        join_error = Some(err);
                    }
                }
            }
        }
        drop(limiter);

        if let Some(err) = join_error {
            return Err(AppError::from(err));
        }

        let summary = RunSummary::from_workers(per_worker, start.elapsed());
        self.observer.on_run_complete(&summary);
        Ok(summary)
    }
}
