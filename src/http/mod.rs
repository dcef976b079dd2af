//! Request dispatch: rate limiting, fingerprinting, retries and the worker pool.
mod fingerprint;
mod rate;
mod retry;
mod sender;
mod transport;

#[cfg(test)]
mod test_support;

pub use fingerprint::{RequestFingerprinter, UserAgentPool};
pub use rate::RateLimiter;
pub use retry::{INITIAL_BACKOFF, MAX_ATTEMPTS, RetryPolicy, RetrySuccess, execute_with_retry};
pub use sender::Dispatcher;
pub use transport::{
    ClientSettings, ReqwestFactory, ReqwestTransport, ResponseMeta, Transport, TransportFactory,
};

#[cfg(test)]
pub(crate) use fingerprint::DEFAULT_USER_AGENTS;
#[cfg(test)]
pub(crate) use rate::RefillSchedule;
#[cfg(test)]
pub(crate) use sender::{PACING_MAX, PACING_MIN, pacing_delay};
#[cfg(test)]
pub(crate) use transport::build_request;
