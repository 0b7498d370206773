//! # Card Entries
//!
//! One ESNcard answer in an order, with the outcome of its lookup.
//! Entries are built fresh for every validation pass.

use crate::card::{CardCode, CardRecord, CardStatus};
use crate::error::RegistryResult;
use crate::position::PositionId;
use serde::{Deserialize, Serialize};

/// Resolved outcome for one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Active,
    NotFound,
    Unregistered,
    Expired,
    /// Registry answered with a status we do not know
    Invalid(String),
    /// Registry could not be asked
    Unavailable,
}

impl EntryStatus {
    /// Map a lookup result onto an entry outcome.
    pub fn from_lookup(result: &RegistryResult<Option<CardRecord>>) -> Self {
        match result {
            Err(_) => EntryStatus::Unavailable,
            Ok(None) => EntryStatus::NotFound,
            Ok(Some(record)) => match &record.status {
                CardStatus::Active => EntryStatus::Active,
                CardStatus::Available => EntryStatus::Unregistered,
                CardStatus::Expired => EntryStatus::Expired,
                CardStatus::Unexpected(other) => EntryStatus::Invalid(other.clone()),
            },
        }
    }
}

/// One card answer tied to a position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub position_id: PositionId,
    pub name: String,
    pub card_number: CardCode,
    pub status: EntryStatus,
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
}

impl CardEntry {
    pub fn new(
        position_id: PositionId,
        name: impl Into<String>,
        card_number: CardCode,
        result: &RegistryResult<Option<CardRecord>>,
    ) -> Self {
        let expiration_date = match result {
            Ok(Some(record)) => record.expiration_date.clone(),
            _ => None,
        };

        Self {
            position_id,
            name: name.into(),
            card_number,
            status: EntryStatus::from_lookup(result),
            duplicate: false,
            expiration_date,
        }
    }

    pub fn with_duplicate(mut self, duplicate: bool) -> Self {
        self.duplicate = duplicate;
        self
    }

    /// True when neither the registry nor the order gives a reason to refuse.
    pub fn is_acceptable(&self) -> bool {
        self.status == EntryStatus::Active && !self.duplicate
    }

    /// `Name (CODE)` as used in messages
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.card_number)
    }
}
