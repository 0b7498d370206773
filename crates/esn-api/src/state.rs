//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the validator, the card cache, global settings and configuration.

use esn_core::{
    BoxedCardLookup, CachedCardLookup, CardCache, MessageConfig, SettingsStore, Validator,
    DEFAULT_CACHE_TTL,
};
use esn_registry::EsnCardClient;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// How long registry answers stay cached
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cache_ttl: std::env::var("ESNCARD_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e)
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// ESNcard validator (wraps the cached registry lookup)
    pub validator: Arc<Validator>,
    /// Registry answer cache
    pub cache: Arc<CardCache>,
    /// Host-platform global settings
    pub settings: Arc<SettingsStore>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the ESNcard registry
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let settings = Arc::new(SettingsStore::new(std::env::var("ESNCARD_CF_TOKEN").ok()));

        let client = EsnCardClient::from_env(settings.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize ESNcard client: {}", e))?;

        let messages = load_message_config()?;

        Ok(Self::with_lookup(config, Arc::new(client), settings, messages))
    }

    /// Assemble state around any card lookup
    pub fn with_lookup(
        config: AppConfig,
        lookup: BoxedCardLookup,
        settings: Arc<SettingsStore>,
        messages: MessageConfig,
    ) -> Self {
        let cache = Arc::new(CardCache::new(config.cache_ttl));
        let cached = CachedCardLookup::new(lookup, cache.clone());
        let validator = Arc::new(Validator::new(Arc::new(cached), messages));

        Self {
            validator,
            cache,
            settings,
            config,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    messages: MessageConfig,
}

/// Load message settings from config file
fn load_message_config() -> anyhow::Result<MessageConfig> {
    let config_paths = [
        "config/esncard.toml",
        "../config/esncard.toml",
        "../../config/esncard.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let file: FileConfig = parse_file_config(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded message settings from {}", path);
            return Ok(file.messages);
        }
    }

    tracing::warn!("No esncard.toml found, using default messages");
    Ok(MessageConfig::default())
}

fn parse_file_config(content: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(content)
}
