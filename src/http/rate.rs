use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::args::PositiveU64;
use crate::shutdown::{CancelSignal, Cancelled};

/// Refill granularity of the token bucket.
const REFILL_TICK: Duration = Duration::from_millis(10);
/// Number of refill ticks per second.
const TICKS_PER_SECOND: u64 = 100;

/// Spreads `rate_per_second` tokens evenly over the refill ticks of one second,
/// carrying the fractional part from tick to tick.
#[derive(Debug, Clone)]
pub(crate) struct RefillSchedule {
    pub rate_per_second: u64,
    pub remainder: u64,
}

impl RefillSchedule {
    pub(crate) const fn new(rate_per_second: u64) -> Self {
        Self {
            rate_per_second,
            remainder: 0,
        }
    }

    pub(crate) fn next_tokens(&mut self) -> usize {
        let (base, rem) = div_mod_u64(self.rate_per_second, TICKS_PER_SECOND);
        let (carry, new_rem) = div_mod_u64(self.remainder.saturating_add(rem), TICKS_PER_SECOND);
        self.remainder = new_rem;
        let tokens = base.saturating_add(carry);
        usize::try_from(tokens).unwrap_or(usize::MAX)
    }
}

/// Token bucket shared by every worker of a run.
///
/// Capacity and refill rate both equal the configured rate. The bucket starts
/// full, so a run may burst up to one second's worth of requests before the
/// refill schedule takes over.
#[derive(Debug)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    capacity: usize,
    refill: JoinHandle<()>,
}

impl RateLimiter {
    /// Creates a full bucket and starts its refill task.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a Tokio runtime.
    #[must_use]
    pub fn new(rate_per_second: PositiveU64) -> Self {
        let capacity = usize::try_from(rate_per_second.get())
            .unwrap_or(Semaphore::MAX_PERMITS)
            .min(Semaphore::MAX_PERMITS);
        let permits = Arc::new(Semaphore::new(capacity));
        let refill = spawn_refill(
            permits.clone(),
            capacity,
            RefillSchedule::new(rate_per_second.get()),
        );
        Self {
            permits,
            capacity,
            refill,
        }
    }

    /// Waits for one token, or for the run to be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] when the cancel signal fires first; no token is
    /// consumed in that case.
    pub async fn acquire(&self, cancel: &mut CancelSignal) -> Result<(), Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(Cancelled),
            permit = self.permits.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    Ok(())
                }
                Err(_closed) => Err(Cancelled),
            },
        }
    }

    /// Takes a token only if one is available right now.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        match self.permits.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_empty) => false,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.refill.abort();
    }
}

fn spawn_refill(
    limiter: Arc<Semaphore>,
    capacity: usize,
    mut schedule: RefillSchedule,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut refill_tick = interval(REFILL_TICK);
        // The first tick completes immediately; the bucket already starts full.
        refill_tick.tick().await;
        loop {
            refill_tick.tick().await;
            let tokens = schedule.next_tokens();
            let available = limiter.available_permits();
            let room = capacity.saturating_sub(available);
            let to_add = tokens.min(room);
            if to_add > 0 {
                limiter.add_permits(to_add);
            }
        }
    })
}

fn div_mod_u64(value: u64, divisor: u64) -> (u64, u64) {
    if divisor == 0 {
        return (0, 0);
    }
    let div = value.checked_div(divisor).unwrap_or(0);
    let rem = value.checked_rem(divisor).unwrap_or(0);
    (div, rem)
}
