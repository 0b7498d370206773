//! # Checkout Messages
//!
//! Turns a set of resolved entries into the single message shown when
//! checkout is blocked.
//!
//! Entries are grouped by outcome and each group becomes one sentence,
//! pluralized when it names more than one entry. Groups always appear in
//! `ReportGroup::ORDER`, so the same input always produces the same text.

use crate::entry::{CardEntry, EntryStatus};
use crate::error::Rejection;
use serde::{Deserialize, Serialize};

/// Deployment-specific bits of the user-facing messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Who to contact when validation keeps failing
    #[serde(default = "default_support_contact")]
    pub support_contact: String,

    /// Where holders register their card
    #[serde(default = "default_registration_url")]
    pub registration_url: String,
}

fn default_support_contact() -> String {
    "support".to_string()
}

fn default_registration_url() -> String {
    "https://esncard.org".to_string()
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            support_contact: default_support_contact(),
            registration_url: default_registration_url(),
        }
    }
}

impl MessageConfig {
    pub fn with_support_contact(mut self, contact: impl Into<String>) -> Self {
        self.support_contact = contact.into();
        self
    }

    /// Per-answer rejection for a resolved status, `None` for active cards.
    pub fn rejection_for(
        &self,
        status: &EntryStatus,
        expiration_date: Option<&str>,
    ) -> Option<Rejection> {
        match status {
            EntryStatus::Active => None,
            EntryStatus::NotFound => Some(Rejection::NotFound),
            EntryStatus::Unregistered => Some(Rejection::Unregistered {
                registration_url: self.registration_url.clone(),
            }),
            EntryStatus::Expired => Some(Rejection::Expired {
                date: expiration_date.unwrap_or("?").to_string(),
            }),
            EntryStatus::Invalid(_) => Some(Rejection::Invalid {
                support_contact: self.support_contact.clone(),
            }),
            EntryStatus::Unavailable => Some(Rejection::ServiceUnavailable {
                support_contact: self.support_contact.clone(),
            }),
        }
    }
}

/// Outcome groups, one sentence each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportGroup {
    NotFound,
    Expired,
    Unregistered,
    Duplicate,
    Invalid,
    Unavailable,
}

impl ReportGroup {
    /// Fixed report order
    pub const ORDER: [ReportGroup; 6] = [
        ReportGroup::NotFound,
        ReportGroup::Expired,
        ReportGroup::Unregistered,
        ReportGroup::Duplicate,
        ReportGroup::Invalid,
        ReportGroup::Unavailable,
    ];

    /// Does `entry` belong in this group? An entry may sit in two groups
    /// (its status group and `Duplicate`).
    fn contains(self, entry: &CardEntry) -> bool {
        match self {
            ReportGroup::NotFound => entry.status == EntryStatus::NotFound,
            ReportGroup::Expired => entry.status == EntryStatus::Expired,
            ReportGroup::Unregistered => entry.status == EntryStatus::Unregistered,
            ReportGroup::Duplicate => entry.duplicate,
            ReportGroup::Invalid => matches!(entry.status, EntryStatus::Invalid(_)),
            ReportGroup::Unavailable => entry.status == EntryStatus::Unavailable,
        }
    }

    fn sentence(self, entries: &[&CardEntry], config: &MessageConfig) -> String {
        let plural = entries.len() > 1;
        let names = join_labels(entries.iter().map(|e| e.label()));

        match self {
            ReportGroup::NotFound if plural => format!(
                "Couldn't find ESNcards for {}, please check for typos.",
                names
            ),
            ReportGroup::NotFound => format!(
                "Couldn't find an ESNcard for {}, please check for typos.",
                names
            ),
            ReportGroup::Expired if plural => format!(
                "The following ESNcards have expired: {}.",
                join_labels(entries.iter().map(|e| {
                    format!("{} on {}", e.label(), e.expiration_date.as_deref().unwrap_or("?"))
                }))
            ),
            ReportGroup::Expired => format!(
                "The ESNcard of {} expired on {}.",
                names,
                entries
                    .first()
                    .and_then(|e| e.expiration_date.as_deref())
                    .unwrap_or("?")
            ),
            ReportGroup::Unregistered if plural => format!(
                "The ESNcards of {} are not registered, please register them on {}. {}",
                names, config.registration_url, REGISTRATION_DELAY_NOTE
            ),
            ReportGroup::Unregistered => format!(
                "The ESNcard of {} is not registered, please register it on {}. {}",
                names, config.registration_url, REGISTRATION_DELAY_NOTE
            ),
            ReportGroup::Duplicate if plural => format!(
                "The ESNcards of {} are used more than once in this order. {}",
                names, UNIQUE_CARD_NOTE
            ),
            ReportGroup::Duplicate => format!(
                "The ESNcard of {} is used more than once in this order. {}",
                names, UNIQUE_CARD_NOTE
            ),
            ReportGroup::Invalid if plural => format!(
                "The ESNcards of {} could not be validated, please contact {}.",
                names, config.support_contact
            ),
            ReportGroup::Invalid => format!(
                "The ESNcard of {} could not be validated, please contact {}.",
                names, config.support_contact
            ),
            ReportGroup::Unavailable if plural => format!(
                "The ESNcards of {} could not be verified because verification is temporarily unavailable. \
                 Please try again later. If the issue persists, contact {}.",
                names, config.support_contact
            ),
            ReportGroup::Unavailable => format!(
                "The ESNcard of {} could not be verified because verification is temporarily unavailable. \
                 Please try again later. If the issue persists, contact {}.",
                names, config.support_contact
            ),
        }
    }
}

const REGISTRATION_DELAY_NOTE: &str =
    "If you recently registered your card, it may take a few hours before it's updated in the systems.";

const UNIQUE_CARD_NOTE: &str = "Each person must have a unique ESNcard.";

/// One combined message for all entries; empty when every entry is fine.
pub fn compose_report(entries: &[CardEntry], config: &MessageConfig) -> String {
    ReportGroup::ORDER
        .iter()
        .filter_map(|group| {
            let members: Vec<&CardEntry> = entries.iter().filter(|e| group.contains(e)).collect();
            if members.is_empty() {
                None
            } else {
                Some(group.sentence(&members, config))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "A", "A and B", "A, B and C"
fn join_labels(labels: impl Iterator<Item = String>) -> String {
    let labels: Vec<String> = labels.collect();
    match labels.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardCode, CardRecord, CardStatus};
    use crate::error::RegistryError;

    fn entry(id: u64, name: &str, raw: &str, status: CardStatus) -> CardEntry {
        let code = CardCode::parse(raw).unwrap();
        let record = CardRecord::new(code.clone(), status);
        CardEntry::new(id, name, code, &Ok(Some(record)))
    }

    fn expired(id: u64, name: &str, raw: &str, date: &str) -> CardEntry {
        let code = CardCode::parse(raw).unwrap();
        let record = CardRecord::new(code.clone(), CardStatus::Expired).with_expiration_date(date);
        CardEntry::new(id, name, code, &Ok(Some(record)))
    }

    fn missing(id: u64, name: &str, raw: &str) -> CardEntry {
        CardEntry::new(id, name, CardCode::parse(raw).unwrap(), &Ok(None))
    }

    #[test]
    fn test_all_acceptable_is_empty() {
        let entries = vec![
            entry(1, "Ann", "AB1", CardStatus::Active),
            entry(2, "Ben", "AB2", CardStatus::Active),
        ];
        assert_eq!(compose_report(&entries, &MessageConfig::default()), "");
        assert_eq!(compose_report(&[], &MessageConfig::default()), "");
    }

    #[test]
    fn test_duplicate_and_expired_report() {
        let entries = vec![
            entry(1, "Ann", "AB1", CardStatus::Active).with_duplicate(true),
            expired(2, "Ben", "AB2", "2024-01-01"),
            entry(3, "Cid", "AB1", CardStatus::Active).with_duplicate(true),
        ];

        let report = compose_report(&entries, &MessageConfig::default());
        assert_eq!(
            report,
            "The ESNcard of Ben (AB2) expired on 2024-01-01. \
             The ESNcards of Ann (AB1) and Cid (AB1) are used more than once in this order. \
             Each person must have a unique ESNcard."
        );
    }

    #[test]
    fn test_groups_follow_fixed_order() {
        let entries = vec![
            entry(1, "Ann", "X1", CardStatus::Unexpected("blocked".into())),
            entry(2, "Ben", "X2", CardStatus::Available),
            missing(3, "Cid", "X3"),
            expired(4, "Dee", "X4", "2023-05-01"),
        ];
        let report = compose_report(&entries, &MessageConfig::default());

        let positions: Vec<usize> = ["Cid (X3)", "Dee (X4)", "Ben (X2)", "Ann (X1)"]
            .iter()
            .map(|needle| report.find(needle).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_plural_sentences() {
        let entries = vec![
            missing(1, "Ann", "N1"),
            missing(2, "Ben", "N2"),
            missing(3, "Cid", "N3"),
        ];
        assert_eq!(
            compose_report(&entries, &MessageConfig::default()),
            "Couldn't find ESNcards for Ann (N1), Ben (N2) and Cid (N3), please check for typos."
        );

        let entries = vec![
            expired(1, "Ann", "E1", "2024-01-01"),
            expired(2, "Ben", "E2", "2023-02-02"),
        ];
        assert_eq!(
            compose_report(&entries, &MessageConfig::default()),
            "The following ESNcards have expired: Ann (E1) on 2024-01-01 and Ben (E2) on 2023-02-02."
        );
    }

    #[test]
    fn test_unavailable_names_support_contact() {
        let code = CardCode::parse("S1").unwrap();
        let entries = vec![CardEntry::new(
            1,
            "Ann",
            code,
            &Err(RegistryError::Network("connection reset".into())),
        )];
        let config = MessageConfig::default().with_support_contact("help@example.org");
        let report = compose_report(&entries, &config);

        assert!(report.contains("temporarily unavailable"));
        assert!(report.contains("help@example.org"));
        assert!(!report.contains("connection reset"));
    }

    #[test]
    fn test_rejected_duplicate_appears_in_both_groups() {
        let entries = vec![
            missing(1, "Ann", "N1").with_duplicate(true),
            missing(2, "Ben", "n 1").with_duplicate(true),
        ];
        let report = compose_report(&entries, &MessageConfig::default());
        assert!(report.starts_with("Couldn't find ESNcards for Ann (N1) and Ben (N1)"));
        assert!(report.contains("are used more than once"));
    }

    #[test]
    fn test_rejection_for_status() {
        let config = MessageConfig::default();
        assert!(config.rejection_for(&EntryStatus::Active, None).is_none());
        assert_eq!(
            config.rejection_for(&EntryStatus::Expired, None),
            Some(Rejection::Expired { date: "?".into() })
        );
        assert_eq!(
            config.rejection_for(&EntryStatus::NotFound, None),
            Some(Rejection::NotFound)
        );
    }

    #[test]
    fn test_join_labels() {
        assert_eq!(join_labels(std::iter::empty()), "");
        assert_eq!(join_labels(["A".to_string()].into_iter()), "A");
        assert_eq!(join_labels(["A".to_string(), "B".to_string()].into_iter()), "A and B");
    }
}
