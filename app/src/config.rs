//! Application configuration loaded from environment variables.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `DASHBOARD_API_URL` | unset | Backend base URL; the in-memory backend is used when unset |
//! | `DASHBOARD_LOG` | `info,dashboard_app=debug` | `tracing` filter directives |
//! | `DASHBOARD_METRICS_ADDR` | unset | Prometheus scrape address, e.g. `0.0.0.0:9090` |
//! | `DASHBOARD_RETRY_MAX` | `3` | Retries of transient LIST/GET failures |
//! | `DASHBOARD_REQUEST_TIMEOUT_MS` | `10000` | Per-call deadline of the HTTP transport |

use dashboard_state_api::OrchestratorConfig;
use dashboard_state_runtime::retry::RetryPolicy;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to a value that does not parse
    #[error("invalid value `{value}` for {var}: {reason}")]
    Invalid {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend base URL
    pub api_url: Option<String>,
    /// `tracing` filter directives
    pub log_filter: String,
    /// Prometheus scrape address
    pub metrics_addr: Option<SocketAddr>,
    /// Retries of transient LIST/GET failures
    pub retry_max: usize,
    /// Per-call deadline of the HTTP transport
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            log_filter: "info,dashboard_app=debug".to_string(),
            metrics_addr: None,
            retry_max: 3,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let set = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        Ok(Self {
            api_url: set("DASHBOARD_API_URL"),
            log_filter: set("DASHBOARD_LOG").unwrap_or(defaults.log_filter),
            metrics_addr: parse(&set, "DASHBOARD_METRICS_ADDR")?,
            retry_max: parse(&set, "DASHBOARD_RETRY_MAX")?.unwrap_or(defaults.retry_max),
            request_timeout: parse(&set, "DASHBOARD_REQUEST_TIMEOUT_MS")?
                .map_or(defaults.request_timeout, Duration::from_millis),
        })
    }

    /// Retry policy of the orchestrator.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder().max_retries(self.retry_max).jitter(0.1).build()
    }

    /// Orchestrator configuration.
    #[must_use]
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig::default().with_retry(self.retry_policy())
    }
}

fn parse<T>(set: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    set(var)
        .map(|value| {
            value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
                var,
                reason: err.to_string(),
                value,
            })
        })
        .transpose()
}
