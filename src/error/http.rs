use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error(
        "HTTP/3 support is not enabled in this build. Rebuild with --features http3 and set \
RUSTFLAGS=\"--cfg reqwest_unstable\"."
    )]
    Http3NotEnabled,
    #[error("Cannot enable http2 and http3 at the same time.")]
    Http2Http3Conflict,
    #[error("Failed to build request: {source}")]
    BuildRequestFailed {
        #[source]
        source: http::Error,
    },
    #[error("Failed to convert request: {source}")]
    ConvertRequestFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to clone request for retry.")]
    CloneRequestFailed,
    #[error("Invalid header value '{value}': {source}")]
    InvalidHeaderValue {
        value: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Request failed: {source}")]
    RequestFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response body: {source}")]
    ReadBodyFailed {
        #[source]
        source: reqwest::Error,
    },
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl HttpError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            HttpError::RequestFailed { source }
            | HttpError::ReadBodyFailed { source }
            | HttpError::ConvertRequestFailed { source } => source.is_timeout(),
            HttpError::BuildClientFailed { .. }
            | HttpError::Http3NotEnabled
            | HttpError::Http2Http3Conflict
            | HttpError::BuildRequestFailed { .. }
            | HttpError::CloneRequestFailed
            | HttpError::InvalidHeaderValue { .. }
            | HttpError::Transport { .. } => false,
        }
    }
}

/// Terminal failure of one logical request after the retry loop gave up.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("Request failed after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: HttpError,
    },
    #[error("Request cancelled after {attempts} attempt(s).")]
    Cancelled { attempts: u32 },
    #[error("Failed to prepare attempt {attempt}: {source}")]
    Prepare {
        attempt: u32,
        #[source]
        source: HttpError,
    },
}

impl RetryError {
    /// Number of attempts that actually reached the transport.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts } => {
                *attempts
            }
            RetryError::Prepare { attempt, .. } => attempt.saturating_sub(1),
        }
    }
}
