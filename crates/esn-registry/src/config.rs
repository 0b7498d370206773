//! # Registry Configuration
//!
//! Configuration for the ESNcard registry client.
//! Defaults point at the public registry; every value can be overridden
//! from the environment.

use crate::retry::RetryPolicy;
use esn_core::{RegistryError, RegistryResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Public ESNcard registry
pub const DEFAULT_API_BASE_URL: &str = "https://esncard.org";

/// Card lookup endpoint, relative to the base URL
pub const CARD_PATH: &str = "/services/1.0/card.json";

/// Header carrying the CDN bypass token
pub const DEFAULT_BYPASS_HEADER: &str = "X-Bypass-Token";

/// ESNcard registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// API base URL (overridable for testing/mocking)
    pub api_base_url: String,

    /// Time allowed to establish a connection
    pub connect_timeout: Duration,

    /// Time allowed for the whole request, including reading the body
    pub request_timeout: Duration,

    /// Retry behaviour for transient server errors
    pub retry: RetryPolicy,

    /// Header name used for the bypass token
    pub bypass_header: String,

    /// Idle connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl RegistryConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `ESNCARD_API_BASE_URL`
    /// - `ESNCARD_CONNECT_TIMEOUT_SECS`
    /// - `ESNCARD_REQUEST_TIMEOUT_SECS`
    /// - `ESNCARD_MAX_RETRIES`
    /// - `ESNCARD_BYPASS_HEADER`
    pub fn from_env() -> RegistryResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let mut config = Self::new();

        if let Ok(url) = env::var("ESNCARD_API_BASE_URL") {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(RegistryError::Configuration(
                    "ESNCARD_API_BASE_URL must start with http:// or https://".to_string(),
                ));
            }
            config.api_base_url = url;
        }

        if let Some(secs) = parse_var::<u64>("ESNCARD_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64>("ESNCARD_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(retries) = parse_var::<u32>("ESNCARD_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }

        if let Ok(header) = env::var("ESNCARD_BYPASS_HEADER") {
            config.bypass_header = header;
        }

        Ok(config)
    }

    /// Create config with default values
    pub fn new() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(6),
            retry: RetryPolicy::default(),
            bypass_header: DEFAULT_BYPASS_HEADER.to_string(),
            pool_max_idle_per_host: 8,
        }
    }

    /// Full URL of the card lookup endpoint
    pub fn card_url(&self) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), CARD_PATH)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder: set bypass header name
    pub fn with_bypass_header(mut self, header: impl Into<String>) -> Self {
        self.bypass_header = header.into();
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: FromStr>(name: &str) -> RegistryResult<Option<T>> {
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> RegistryResult<T> {
    raw.trim().parse().map_err(|_| {
        RegistryError::Configuration(format!("{} is not a valid number: {:?}", name, raw))
    })
}
