//! # esn-registry
//!
//! ESNcard registry client for esncard-validator-rs.
//!
//! - `EsnCardClient`: pooled `reqwest` client implementing `CardLookup`
//! - `RegistryConfig`: timeouts, retry policy and endpoint, from env or builder
//! - `RetryPolicy`: bounded exponential backoff for 5xx responses
//! - `parse_card_payload`: folds the registry's response shapes into
//!   `Option<CardRecord>`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use esn_core::{CachedCardLookup, CardCache, CardLookup, SettingsStore};
//! use esn_registry::EsnCardClient;
//!
//! let settings = Arc::new(SettingsStore::new(std::env::var("ESNCARD_CF_TOKEN").ok()));
//! let client = EsnCardClient::from_env(settings)?;
//! let lookup = CachedCardLookup::new(Arc::new(client), Arc::new(CardCache::default()));
//!
//! let record = lookup.fetch_card(&code).await?;
//! ```

pub mod client;
pub mod config;
pub mod payload;
pub mod retry;

// Re-exports
pub use client::EsnCardClient;
pub use config::{RegistryConfig, CARD_PATH, DEFAULT_API_BASE_URL, DEFAULT_BYPASS_HEADER};
pub use payload::parse_card_payload;
pub use retry::{retry_with_backoff, RetryPolicy};
