use url::Url;

use crate::args::{PositiveU64, PositiveUsize};
use crate::error::ValidationError;

/// Validated, immutable parameters of one load run.
///
/// The only way to obtain a `RunConfig` is through [`RunConfig::new`] or
/// [`RunConfig::from_parts`], so every instance handed to the dispatcher has
/// a usable target and non-zero counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    target: Url,
    worker_count: PositiveUsize,
    requests_per_worker: PositiveU64,
    rate_per_second: PositiveU64,
}

impl RunConfig {
    /// Validates raw run parameters.
    ///
    /// # Errors
    ///
    /// Returns an error when the target is not an absolute http(s) URL with a
    /// host, or when any count or the rate is zero.
    pub fn new(
        target: &str,
        worker_count: usize,
        requests_per_worker: u64,
        rate_per_second: u64,
    ) -> Result<Self, ValidationError> {
        let worker_count = PositiveUsize::try_from(worker_count).map_err(|_err| {
            ValidationError::FieldTooSmall {
                field: "worker count",
                min: 1,
            }
        })?;
        let requests_per_worker = PositiveU64::try_from(requests_per_worker).map_err(|_err| {
            ValidationError::FieldTooSmall {
                field: "requests per worker",
                min: 1,
            }
        })?;
        let rate_per_second = PositiveU64::try_from(rate_per_second).map_err(|_err| {
            ValidationError::FieldTooSmall {
                field: "rate per second",
                min: 1,
            }
        })?;
        Self::from_parts(target, worker_count, requests_per_worker, rate_per_second)
    }

    /// Builds a config from already-positive counts.
    ///
    /// # Errors
    ///
    /// Returns an error when the target URL is malformed, lacks a host, or
    /// uses a scheme other than http/https.
    pub fn from_parts(
        target: &str,
        worker_count: PositiveUsize,
        requests_per_worker: PositiveU64,
        rate_per_second: PositiveU64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            target: parse_target(target)?,
            worker_count,
            requests_per_worker,
            rate_per_second,
        })
    }

    #[must_use]
    pub const fn target(&self) -> &Url {
        &self.target
    }

    #[must_use]
    pub const fn worker_count(&self) -> PositiveUsize {
        self.worker_count
    }

    #[must_use]
    pub const fn requests_per_worker(&self) -> PositiveU64 {
        self.requests_per_worker
    }

    #[must_use]
    pub const fn rate_per_second(&self) -> PositiveU64 {
        self.rate_per_second
    }

    /// Total requests the run plans to issue across all workers.
    #[must_use]
    pub fn planned_requests(&self) -> u64 {
        u64::try_from(self.worker_count.get())
            .unwrap_or(u64::MAX)
            .saturating_mul(self.requests_per_worker.get())
    }
}

fn parse_target(raw: &str) -> Result<Url, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let url = Url::parse(trimmed).map_err(|err| ValidationError::InvalidUrl {
        url: trimmed.to_owned(),
        source: err,
    })?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::UnsupportedScheme {
                scheme: other.to_owned(),
            });
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::UrlMissingHost);
    }
    Ok(url)
}
