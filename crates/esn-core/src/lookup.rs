//! # Card Lookup Trait
//!
//! Seam between the validation rules and whatever answers "what is the
//! status of card X". The registry HTTP client implements it, the cache wraps
//! it, and tests swap in fakes.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              CardLookup (trait)               │
//! │  ├── fetch_card()                             │
//! │  └── source_name()                            │
//! └───────────────────────────────────────────────┘
//!                        ▲
//!            ┌───────────┴───────────┐
//!            │                       │
//!   ┌────────┴────────┐    ┌─────────┴────────┐
//!   │  EsnCardClient  │◄───│ CachedCardLookup │
//!   │  (esn-registry) │    │   (TTL cache)    │
//!   └─────────────────┘    └──────────────────┘
//! ```

use crate::card::{CardCode, CardRecord};
use crate::error::RegistryResult;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Fetch one card record by code.
#[async_trait]
pub trait CardLookup: Send + Sync {
    /// Look up a card.
    ///
    /// # Returns
    /// `Ok(None)` when the registry does not know the card,
    /// `Err(_)` when the registry could not be asked.
    async fn fetch_card(&self, code: &CardCode) -> RegistryResult<Option<CardRecord>>;

    /// Name of the backing source (for logging).
    fn source_name(&self) -> &'static str;
}

/// Type alias for a shared card lookup (dynamic dispatch)
pub type BoxedCardLookup = Arc<dyn CardLookup>;

/// Host-platform global settings, re-read on every registry call.
pub trait SettingsSource: Send + Sync {
    /// Token used to get past the registry CDN's bot protection.
    fn bypass_token(&self) -> Option<String>;
}

/// Type alias for shared settings
pub type BoxedSettingsSource = Arc<dyn SettingsSource>;

/// In-memory settings that can be rotated at runtime.
#[derive(Debug, Default)]
pub struct SettingsStore {
    bypass_token: RwLock<Option<String>>,
}

impl SettingsStore {
    pub fn new(bypass_token: Option<String>) -> Self {
        Self {
            bypass_token: RwLock::new(clean_token(bypass_token)),
        }
    }

    /// Replace the bypass token. Blank tokens clear it.
    pub fn set_bypass_token(&self, token: Option<String>) {
        let mut guard = self
            .bypass_token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = clean_token(token);
    }

    pub fn has_bypass_token(&self) -> bool {
        self.bypass_token().is_some()
    }
}

impl SettingsSource for SettingsStore {
    fn bypass_token(&self) -> Option<String> {
        self.bypass_token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn clean_token(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
