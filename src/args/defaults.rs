/// Matches the fixed admission rate the tool has always shipped with.
pub(crate) const DEFAULT_RATE_PER_SECOND: &str = "20";
pub(crate) const DEFAULT_REQUEST_TIMEOUT: &str = "30s";
pub(crate) const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
