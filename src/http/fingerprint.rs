use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use reqwest::Request;
use reqwest::header::{HeaderValue, USER_AGENT};

use crate::error::{AppError, AppResult, HttpError, ValidationError};

/// Built-in user-agent rotation.
pub(crate) const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.82 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0.3 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/86.0",
];

/// Fixed, non-empty set of `User-Agent` values shared by all workers.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    values: Arc<[HeaderValue]>,
}

impl UserAgentPool {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            values: DEFAULT_USER_AGENTS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect(),
        }
    }

    /// Builds a pool from user-supplied strings.
    ///
    /// # Errors
    ///
    /// Returns an error when `values` is empty or any entry is not a valid
    /// header value.
    pub fn from_values<I, S>(values: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for value in values {
            let value = value.as_ref();
            let header = HeaderValue::from_str(value).map_err(|err| {
                AppError::http(HttpError::InvalidHeaderValue {
                    value: value.to_owned(),
                    source: err,
                })
            })?;
            parsed.push(header);
        }
        if parsed.is_empty() {
            return Err(AppError::validation(ValidationError::EmptyUserAgentPool));
        }
        Ok(Self {
            values: parsed.into(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> Option<&HeaderValue> {
        if self.values.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.values.len());
        self.values.get(index)
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Per-worker request randomizer.
///
/// Owns its own non-cryptographic RNG so workers never contend on shared
/// random state.
#[derive(Debug)]
pub struct RequestFingerprinter {
    pool: UserAgentPool,
    rng: SmallRng,
}

impl RequestFingerprinter {
    #[must_use]
    pub fn new(pool: UserAgentPool) -> Self {
        Self {
            pool,
            rng: SmallRng::from_entropy(),
        }
    }

    #[must_use]
    pub fn seeded(pool: UserAgentPool, seed: u64) -> Self {
        Self {
            pool,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Sets a uniformly chosen `User-Agent` on `request`.
    pub fn apply(&mut self, request: &mut Request) {
        if let Some(value) = self.pool.pick(&mut self.rng) {
            request.headers_mut().insert(USER_AGENT, value.clone());
        }
    }
}
