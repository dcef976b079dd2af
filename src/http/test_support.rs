use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Request;
use tokio::time::Instant;

use crate::domain::Outcome;
use crate::error::HttpError;
use crate::metrics::RunObserver;

use super::transport::{ResponseMeta, Transport, TransportFactory};

pub(crate) fn scripted_failure() -> HttpError {
    HttpError::Transport {
        message: "scripted failure".to_owned(),
    }
}

/// Plays back a fixed list of results, then keeps answering with `fallback`.
#[derive(Debug)]
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    calls: AtomicU32,
    call_times: Mutex<Vec<Instant>>,
    user_agents: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn always_ok() -> Self {
        Self::with_script(Vec::new(), true)
    }

    pub(crate) fn always_failing() -> Self {
        Self::with_script(Vec::new(), false)
    }

    pub(crate) fn with_script(script: Vec<bool>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
            call_times: Mutex::new(Vec::new()),
            user_agents: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn call_times(&self) -> Vec<Instant> {
        self.call_times
            .lock()
            .map(|times| times.clone())
            .unwrap_or_default()
    }

    pub(crate) fn user_agents(&self) -> Vec<String> {
        self.user_agents
            .lock()
            .map(|agents| agents.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: Request) -> Result<ResponseMeta, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut times) = self.call_times.lock() {
            times.push(Instant::now());
        }
        if let Some(agent) = request
            .headers()
            .get(reqwest::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            && let Ok(mut agents) = self.user_agents.lock()
        {
            agents.push(agent.to_owned());
        }
        let succeed = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or(self.fallback);
        if succeed {
            Ok(ResponseMeta {
                status: 200,
                body_bytes: 0,
            })
        } else {
            Err(scripted_failure())
        }
    }
}

/// Lets several workers share one scripted transport.
#[derive(Debug, Clone)]
pub(crate) struct SharedTransport(pub(crate) Arc<ScriptedTransport>);

#[async_trait]
impl Transport for SharedTransport {
    async fn execute(&self, request: Request) -> Result<ResponseMeta, HttpError> {
        self.0.execute(request).await
    }
}

/// Hands every worker the same transport; the first `failing_creations`
/// calls fail instead.
#[derive(Debug)]
pub(crate) struct MockFactory {
    transport: Arc<ScriptedTransport>,
    failing_creations: usize,
    created: AtomicUsize,
}

impl MockFactory {
    pub(crate) fn new(transport: Arc<ScriptedTransport>) -> Self {
        Self {
            transport,
            failing_creations: 0,
            created: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing_first(transport: Arc<ScriptedTransport>, failing: usize) -> Self {
        Self {
            failing_creations: failing,
            ..Self::new(transport)
        }
    }
}

impl TransportFactory for MockFactory {
    type Transport = SharedTransport;

    fn create_transport(&self) -> Result<SharedTransport, HttpError> {
        let index = self.created.fetch_add(1, Ordering::SeqCst);
        if index < self.failing_creations {
            return Err(HttpError::Transport {
                message: "client construction refused".to_owned(),
            });
        }
        Ok(SharedTransport(Arc::clone(&self.transport)))
    }
}

/// Keeps every outcome it sees.
#[derive(Debug, Default)]
pub(crate) struct RecordingObserver {
    outcomes: Mutex<Vec<Outcome>>,
}

impl RecordingObserver {
    pub(crate) fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes
            .lock()
            .map(|outcomes| outcomes.clone())
            .unwrap_or_default()
    }
}

impl RunObserver for RecordingObserver {
    fn on_outcome(&self, outcome: &Outcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push(outcome.clone());
        }
    }
}
