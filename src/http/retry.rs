use std::time::Duration;

use reqwest::Request;

use crate::error::{HttpError, RetryError};
use crate::shutdown::CancelSignal;

use super::transport::{ResponseMeta, Transport};

/// Attempt budget for one logical request.
pub const MAX_ATTEMPTS: u32 = 3;
/// Delay before the first retry; doubles for every further retry.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
}

impl RetryPolicy {
    /// A policy with `max_attempts` total attempts; zero is treated as one.
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        let max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        Self {
            max_attempts,
            initial_backoff: INITIAL_BACKOFF,
        }
    }

    #[must_use]
    pub const fn standard() -> Self {
        Self::new(MAX_ATTEMPTS)
    }

    #[must_use]
    pub const fn max_attempts(self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn should_retry(self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Sleep before retry number `retry_index` (0-based): 100ms, 200ms, 400ms, ...
    #[must_use]
    pub fn backoff_for(self, retry_index: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry_index))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Progress of one logical request through its attempt budget.
#[derive(Debug)]
struct RetryState {
    attempts_made: u32,
    backoff: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySuccess {
    pub response: ResponseMeta,
    pub attempts: u32,
}

/// Sends `request` until it succeeds or the policy's budget runs out.
///
/// `on_failure` sees every failed attempt together with the backoff that will
/// follow it (`None` when no retry follows). Backoff sleeps end early when the
/// run is cancelled.
///
/// # Errors
///
/// Returns [`RetryError::Exhausted`] with the last transport error once every
/// attempt failed, [`RetryError::Cancelled`] when cancellation interrupted a
/// backoff, and [`RetryError::Prepare`] when the request could not be cloned
/// for an attempt.
pub async fn execute_with_retry<T, F>(
    transport: &T,
    request: &Request,
    policy: RetryPolicy,
    cancel: &mut CancelSignal,
    mut on_failure: F,
) -> Result<RetrySuccess, RetryError>
where
    T: Transport + ?Sized,
    F: FnMut(u32, &HttpError, Option<Duration>),
{
    let mut state = RetryState {
        attempts_made: 0,
        backoff: policy.initial_backoff,
    };

    loop {
        let attempt = state.attempts_made.saturating_add(1);
        let Some(attempt_request) = request.try_clone() else {
            return Err(RetryError::Prepare {
                attempt,
                source: HttpError::CloneRequestFailed,
            });
        };
        state.attempts_made = attempt;

        match transport.execute(attempt_request).await {
            Ok(response) => {
                return Ok(RetrySuccess {
                    response,
                    attempts: state.attempts_made,
                });
            }
            Err(err) => {
                if !policy.should_retry(state.attempts_made) {
                    on_failure(state.attempts_made, &err, None);
                    return Err(RetryError::Exhausted {
                        attempts: state.attempts_made,
                        source: err,
                    });
                }
                on_failure(state.attempts_made, &err, Some(state.backoff));
                if cancel.sleep(state.backoff).await.is_err() {
                    return Err(RetryError::Cancelled {
                        attempts: state.attempts_made,
                    });
                }
                state.backoff = state.backoff.saturating_mul(2);
            }
        }
    }
}
