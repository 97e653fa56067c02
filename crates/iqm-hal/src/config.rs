//! Client configuration.
//!
//! Values come from defaults, optionally overlaid with environment variables:
//!
//! | Field | Default | Environment |
//! |-------|---------|-------------|
//! | `requests_timeout_secs` | 60 | `IQM_CLIENT_REQUESTS_TIMEOUT` |
//! | `seconds_between_calls` | 1.0 | `IQM_CLIENT_SECONDS_BETWEEN_CALLS` |
//! | `default_wait_timeout_secs` | 900 | |
//! | `client_signature` | none | |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HalError, HalResult};

/// Default timeout of a single HTTP request, in seconds.
pub const DEFAULT_REQUESTS_TIMEOUT_SECS: u64 = 60;

/// Default time to wait for a job, in seconds.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 900;

const ENV_REQUESTS_TIMEOUT: &str = "IQM_CLIENT_REQUESTS_TIMEOUT";
const ENV_SECONDS_BETWEEN_CALLS: &str = "IQM_CLIENT_SECONDS_BETWEEN_CALLS";

/// Settings shared by all requests of a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout of a single HTTP request.
    #[serde(default = "default_requests_timeout")]
    pub requests_timeout_secs: f64,

    /// Pause between polls and between retries of a 502 response.
    #[serde(default = "default_seconds_between_calls")]
    pub seconds_between_calls: f64,

    /// How long the wait helpers poll before giving up.
    #[serde(default = "default_wait_timeout")]
    pub default_wait_timeout_secs: f64,

    /// Appended to the `User-Agent` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_signature: Option<String>,
}

fn default_requests_timeout() -> f64 {
    DEFAULT_REQUESTS_TIMEOUT_SECS as f64
}

fn default_seconds_between_calls() -> f64 {
    1.0
}

fn default_wait_timeout() -> f64 {
    DEFAULT_WAIT_TIMEOUT_SECS as f64
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_timeout_secs: default_requests_timeout(),
            seconds_between_calls: default_seconds_between_calls(),
            default_wait_timeout_secs: default_wait_timeout(),
            client_signature: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with the `IQM_CLIENT_*` environment variables.
    pub fn from_env() -> HalResult<Self> {
        Self::default().with_lookup(|name| std::env::var(name).ok())
    }

    fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> HalResult<Self> {
        if let Some(value) = lookup(ENV_REQUESTS_TIMEOUT) {
            self.requests_timeout_secs = parse_seconds(ENV_REQUESTS_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_SECONDS_BETWEEN_CALLS) {
            self.seconds_between_calls = parse_seconds(ENV_SECONDS_BETWEEN_CALLS, &value)?;
        }
        Ok(self)
    }

    /// Set the caller signature sent with every request.
    pub fn with_client_signature(mut self, signature: impl Into<String>) -> Self {
        self.client_signature = Some(signature.into());
        self
    }

    /// Set the pause between polls.
    pub fn with_seconds_between_calls(mut self, seconds: f64) -> Self {
        self.seconds_between_calls = seconds;
        self
    }

    /// Timeout of a single HTTP request.
    pub fn requests_timeout(&self) -> Duration {
        seconds(self.requests_timeout_secs)
    }

    /// Pause between polls.
    pub fn poll_interval(&self) -> Duration {
        seconds(self.seconds_between_calls)
    }

    /// Default deadline of the wait helpers.
    pub fn wait_timeout(&self) -> Duration {
        seconds(self.default_wait_timeout_secs)
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn parse_seconds(name: &str, value: &str) -> HalResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(HalError::ClientConfiguration(format!(
            "Invalid value for {name}: {value:?}, expected a non-negative number of seconds"
        ))),
    }
}
