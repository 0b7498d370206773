//! # Card Types
//!
//! ESNcard codes, registry statuses and fetched records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize a raw card number: drop all whitespace, upper-case the rest.
///
/// Idempotent, so `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A normalized ESNcard number.
///
/// Two codes typed with different spacing or case compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardCode(String);

impl CardCode {
    /// Parse a user answer. Blank input means "not answered" and yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = normalize(raw);
        if code.is_empty() {
            None
        } else {
            Some(Self(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CardCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Card status as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardStatus {
    /// Registered and valid
    Active,
    /// Issued but not yet registered by its holder
    Available,
    /// Past its expiration date
    Expired,
    /// Anything else the registry sends back
    Unexpected(String),
}

impl CardStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CardStatus::Active => "active",
            CardStatus::Available => "available",
            CardStatus::Expired => "expired",
            CardStatus::Unexpected(other) => other,
        }
    }

    /// Available cards are never cached so a fresh registration shows up quickly.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, CardStatus::Available)
    }
}

impl From<&str> for CardStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => CardStatus::Active,
            "available" => CardStatus::Available,
            "expired" => CardStatus::Expired,
            _ => CardStatus::Unexpected(value.to_string()),
        }
    }
}

impl From<String> for CardStatus {
    fn from(value: String) -> Self {
        CardStatus::from(value.as_str())
    }
}

impl From<CardStatus> for String {
    fn from(status: CardStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A card as fetched from the registry. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Card code (as returned by the registry, normalized)
    pub code: CardCode,

    /// Registry status
    pub status: CardStatus,

    /// Expiration date, present when the card has expired
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    /// Untouched registry payload
    #[serde(default)]
    pub raw: serde_json::Value,

    /// When the record was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CardRecord {
    pub fn new(code: CardCode, status: CardStatus) -> Self {
        Self {
            code,
            status,
            expiration_date: None,
            raw: serde_json::Value::Null,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_expiration_date(mut self, date: impl Into<String>) -> Self {
        self.expiration_date = Some(date.into());
        self
    }

    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }
}
