//! # ESNcard Registry Client
//!
//! `CardLookup` implementation backed by the ESNcard registry HTTP API.

use crate::config::RegistryConfig;
use crate::payload::parse_card_payload;
use crate::retry::retry_with_backoff;
use async_trait::async_trait;
use esn_core::{
    BoxedSettingsSource, CardCode, CardLookup, CardRecord, RegistryError, RegistryResult,
};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, instrument};

/// Longest response body kept in an error message
const MAX_ERROR_BODY: usize = 512;

/// Registry client.
///
/// The underlying `reqwest::Client` owns a connection pool and is built once;
/// cloning the client shares that pool. The bypass token is read from
/// `settings` on every request, so rotating it never rebuilds the pool.
#[derive(Clone)]
pub struct EsnCardClient {
    config: RegistryConfig,
    client: Client,
    bypass_header: HeaderName,
    settings: BoxedSettingsSource,
}

impl EsnCardClient {
    /// Create a new registry client
    pub fn new(config: RegistryConfig, settings: BoxedSettingsSource) -> RegistryResult<Self> {
        let bypass_header = HeaderName::from_bytes(config.bypass_header.as_bytes()).map_err(|e| {
            RegistryError::Configuration(format!(
                "Invalid bypass header name {:?}: {}",
                config.bypass_header, e
            ))
        })?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(concat!("esncard-validator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                RegistryError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            config,
            client,
            bypass_header,
            settings,
        })
    }

    /// Create from environment variables
    pub fn from_env(settings: BoxedSettingsSource) -> RegistryResult<Self> {
        let config = RegistryConfig::from_env()?;
        Self::new(config, settings)
    }

    /// One GET against the card endpoint, returning the body of a 2xx answer.
    async fn request_once(&self, code: &CardCode) -> RegistryResult<String> {
        let mut request = self
            .client
            .get(self.config.card_url())
            .query(&[("code", code.as_str())]);

        if let Some(token) = self.settings.bypass_token() {
            let value = HeaderValue::from_str(&token).map_err(|_| {
                RegistryError::Configuration("Bypass token is not a valid header value".to_string())
            })?;
            request = request.header(self.bypass_header.clone(), value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(RegistryError::HttpStatus {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl CardLookup for EsnCardClient {
    #[instrument(skip(self), fields(code = %code))]
    async fn fetch_card(&self, code: &CardCode) -> RegistryResult<Option<CardRecord>> {
        let body = retry_with_backoff(
            &self.config.retry,
            || self.request_once(code),
            RegistryError::is_retryable,
        )
        .await?;

        let record = parse_card_payload(&body, code)?;

        debug!(
            found = record.is_some(),
            status = record.as_ref().map(|r| r.status.as_str()).unwrap_or("-"),
            "Fetched ESNcard from registry"
        );

        Ok(record)
    }

    fn source_name(&self) -> &'static str {
        "esncard.org"
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}
