//! Backend configuration.
//!
//! `BackendConfig` carries the base URL, the ordered default headers, the
//! request-logging switch, an optional transport timeout and an optional cap
//! on response body size. It can be deserialized, built in code, or read
//! from `RESTREPO_*` environment variables.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpHeader;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

pub const ENV_BASE_URL: &str = "RESTREPO_BASE_URL";
pub const ENV_LOG_REQUESTS: &str = "RESTREPO_LOG_REQUESTS";
pub const ENV_TIMEOUT_MS: &str = "RESTREPO_TIMEOUT_MS";
pub const ENV_MAX_RESPONSE_BYTES: &str = "RESTREPO_MAX_RESPONSE_BYTES";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be true/false/1/0, got `{value}`")]
    InvalidFlag { key: &'static str, value: String },

    #[error("{key} must be a number of milliseconds, got `{value}`")]
    InvalidTimeout { key: &'static str, value: String },

    #[error("{key} must be a number of bytes, got `{value}`")]
    InvalidSize { key: &'static str, value: String },
}

/// Settings consumed by `HttpBackend`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub headers: Vec<HttpHeader>,
    pub log_requests: bool,
    /// Whole-request timeout. `None` leaves it to the transport defaults.
    #[serde(with = "optional_millis")]
    pub timeout: Option<Duration>,
    /// Largest response body read in full. `None` reads bodies of any size.
    pub max_response_bytes: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: default_headers(),
            log_requests: true,
            timeout: None,
            max_response_bytes: None,
        }
    }
}

/// `Accept` and `Content-Type` set to `application/json`.
pub fn default_headers() -> Vec<HttpHeader> {
    vec![
        HttpHeader::new("Accept", "application/json"),
        HttpHeader::new("Content-Type", "application/json"),
    ]
}

impl BackendConfig {
    /// Default headers with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Append an extra header after the existing ones.
    pub fn with_header(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HttpHeader::new(field, value));
        self
    }

    pub fn with_log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_response_bytes(mut self, limit: u64) -> Self {
        self.max_response_bytes = Some(limit);
        self
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(value) = lookup(ENV_LOG_REQUESTS) {
            config.log_requests = parse_flag(&value).ok_or(ConfigError::InvalidFlag {
                key: ENV_LOG_REQUESTS,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            let millis: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidTimeout {
                key: ENV_TIMEOUT_MS,
                value: value.clone(),
            })?;
            config.timeout = Some(Duration::from_millis(millis));
        }
        if let Some(value) = lookup(ENV_MAX_RESPONSE_BYTES) {
            let limit: u64 = value.trim().parse().map_err(|_| ConfigError::InvalidSize {
                key: ENV_MAX_RESPONSE_BYTES,
                value: value.clone(),
            })?;
            config.max_response_bytes = Some(limit);
        }
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
