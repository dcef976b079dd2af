use clap::Parser;
use std::time::Duration;

use super::defaults::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_RATE_PER_SECOND, DEFAULT_REQUEST_TIMEOUT};
use super::parsers::{parse_duration_arg, parse_positive_u64, parse_positive_usize};
use super::types::{OutputFormat, PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Concurrent HTTP load generator - fixed worker pool, shared token-bucket rate limit, per-request retry with backoff and rotating request fingerprints.",
    next_help_heading = "Advanced Options"
)]
pub struct VolleyArgs {
    /// Target URL (prompted for when missing)
    #[arg(long, short, env = "VOLLEY_URL", help_heading = "Common Options")]
    pub url: Option<String>,

    /// Number of concurrent workers (prompted for when missing)
    #[arg(long, short = 'w', value_parser = parse_positive_usize, help_heading = "Common Options")]
    pub workers: Option<PositiveUsize>,

    /// Requests issued by each worker (prompted for when missing)
    #[arg(long, short = 'n', value_parser = parse_positive_u64, help_heading = "Common Options")]
    pub requests: Option<PositiveU64>,

    /// Global admission rate shared by all workers (requests per second)
    #[arg(
        long = "rate",
        short = 'r',
        default_value = DEFAULT_RATE_PER_SECOND,
        value_parser = parse_positive_u64,
        help_heading = "Common Options"
    )]
    pub rate_per_second: PositiveU64,

    /// Path to a TOML or JSON config file (defaults to ./volley.toml or ./volley.json)
    #[arg(long, short)]
    pub config: Option<String>,

    /// Fail instead of prompting for missing values
    #[arg(long = "no-prompt")]
    pub no_prompt: bool,

    /// Per-request timeout (e.g. 30s, 500ms)
    #[arg(long = "timeout", default_value = DEFAULT_REQUEST_TIMEOUT, value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// TCP connect timeout (e.g. 10s)
    #[arg(long = "connect-timeout", default_value = DEFAULT_CONNECT_TIMEOUT, value_parser = parse_duration_arg)]
    pub connect_timeout: Duration,

    /// Accept invalid TLS certificates and hostnames
    #[arg(long)]
    pub insecure: bool,

    /// Use HTTP/2 prior knowledge
    #[arg(long, conflicts_with = "http3")]
    pub http2: bool,

    /// Use HTTP/3 (requires building with the http3 feature)
    #[arg(long)]
    pub http3: bool,

    /// User-Agent values to rotate through (repeatable; replaces the built-in pool)
    #[arg(long = "user-agent", short = 'A')]
    pub user_agents: Vec<String>,

    /// Summary output format
    #[arg(
        long = "output-format",
        default_value = "text",
        value_enum,
        help_heading = "Common Options"
    )]
    pub output_format: OutputFormat,

    /// Exit with an error when any request failed
    #[arg(long = "fail-on-error")]
    pub fail_on_error: bool,

    /// Serve live outcome and latency counters as JSON on this address (e.g. 127.0.0.1:6060)
    #[arg(long = "diagnostics-addr")]
    pub diagnostics_addr: Option<String>,

    /// Emit log lines as JSON
    #[arg(long = "log-json")]
    pub log_json: bool,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,
}
