use std::time::Duration;

use serde::Deserialize;

use crate::args::{OutputFormat, parse_duration_arg};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

/// Run settings read from `volley.toml` / `volley.json`.
///
/// Every field is optional; values given on the command line win.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub workers: Option<usize>,
    pub requests: Option<u64>,
    pub rate: Option<u64>,
    pub timeout: Option<DurationValue>,
    pub connect_timeout: Option<DurationValue>,
    pub insecure: Option<bool>,
    pub http2: Option<bool>,
    pub http3: Option<bool>,
    pub user_agents: Option<Vec<String>>,
    pub output_format: Option<OutputFormat>,
    pub fail_on_error: Option<bool>,
    pub diagnostics_addr: Option<String>,
}

/// Either a bare number of seconds or a duration string such as `"500ms"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> AppResult<Duration> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(AppError::config(ConfigError::InvalidField {
                        field,
                        source: ValidationError::DurationZero,
                    }))
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}
