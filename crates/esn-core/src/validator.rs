//! # Validator
//!
//! The two checks the host platform runs:
//!
//! - `validate_field`: one ESNcard answer, as the attendee fills in the form.
//! - `validate_checkout`: every ESNcard answer of a cart/order, right before
//!   the order is placed.

use crate::card::{CardCode, CardRecord};
use crate::duplicate::{duplicate_codes, is_duplicate};
use crate::entry::{CardEntry, EntryStatus};
use crate::error::{CheckoutAborted, RegistryResult, Rejection};
use crate::lookup::BoxedCardLookup;
use crate::messages::{compose_report, MessageConfig};
use crate::position::{Position, SubmittedAnswers};
use std::collections::HashMap;
use tracing::{error, info, instrument};

/// Checks ESNcard answers against a card lookup.
#[derive(Clone)]
pub struct Validator {
    lookup: BoxedCardLookup,
    messages: MessageConfig,
}

impl Validator {
    pub fn new(lookup: BoxedCardLookup, messages: MessageConfig) -> Self {
        Self { lookup, messages }
    }

    /// Fetch a card, logging registry failures with full detail.
    async fn lookup(&self, code: &CardCode) -> RegistryResult<Option<CardRecord>> {
        let result = self.lookup.fetch_card(code).await;
        if let Err(e) = &result {
            error!(
                code = %code,
                source = self.lookup.source_name(),
                error = %e,
                "ESNcard lookup failed"
            );
        }
        result
    }

    /// Accept or reject a lookup result for one card.
    pub fn check_record(
        &self,
        result: &RegistryResult<Option<CardRecord>>,
    ) -> Result<(), Rejection> {
        let expiration_date = match result {
            Ok(Some(record)) => record.expiration_date.as_deref(),
            _ => None,
        };

        match self
            .messages
            .rejection_for(&EntryStatus::from_lookup(result), expiration_date)
        {
            Some(rejection) => Err(rejection),
            None => Ok(()),
        }
    }

    /// Validate a single answer without looking at other positions.
    ///
    /// Blank answers are accepted without contacting the registry.
    #[instrument(skip(self))]
    pub async fn validate_answer(&self, answer: &str) -> Result<(), Rejection> {
        let Some(code) = CardCode::parse(answer) else {
            return Ok(());
        };

        let result = self.lookup(&code).await;
        self.check_record(&result)
    }

    /// Validate the answer typed into one position's ESNcard field.
    ///
    /// `siblings` are the positions of the same cart/order (the validated
    /// position may be among them and is skipped). Duplicates are reported
    /// before the registry is asked. When the position itself carries no
    /// ESNcard question, the siblings' question is used to read their answers.
    #[instrument(skip(self, position, siblings, submitted), fields(position_id = position.id))]
    pub async fn validate_field(
        &self,
        answer: &str,
        position: &Position,
        siblings: &[Position],
        submitted: &SubmittedAnswers,
    ) -> Result<(), Rejection> {
        let Some(code) = CardCode::parse(answer) else {
            return Ok(());
        };

        let question = position
            .esncard_question()
            .or_else(|| siblings.iter().find_map(Position::esncard_question));

        let outcome = match question {
            Some(question) if is_duplicate(&code, position.id, &question, siblings, submitted) => {
                Err(Rejection::Duplicate)
            }
            _ => {
                let result = self.lookup(&code).await;
                self.check_record(&result)
            }
        };

        match &outcome {
            Err(rejection) if rejection.is_service_failure() => {
                error!(
                    name = position.display_name(),
                    card_number = %code,
                    "ESNcard validation could not reach the registry"
                );
            }
            Err(rejection) => {
                info!(
                    name = position.display_name(),
                    card_number = %code,
                    kind = rejection.kind(),
                    "ESNcard validation failed: {}",
                    rejection
                );
            }
            Ok(()) => {}
        }

        outcome
    }

    /// Resolve every ESNcard answer in a cart/order.
    ///
    /// Each distinct code is looked up once. Positions without an ESNcard
    /// question or with a blank answer produce no entry.
    #[instrument(skip(self, positions, submitted), fields(positions = positions.len()))]
    pub async fn resolve_entries(
        &self,
        positions: &[Position],
        submitted: &SubmittedAnswers,
    ) -> Vec<CardEntry> {
        let answered: Vec<(&Position, CardCode)> = positions
            .iter()
            .filter_map(|position| {
                let question = position.esncard_question()?;
                let answer = submitted.current_card_answer(position, &question)?;
                CardCode::parse(&answer).map(|code| (position, code))
            })
            .collect();

        let duplicates = duplicate_codes(answered.iter().map(|(_, code)| code));

        let mut results: HashMap<CardCode, RegistryResult<Option<CardRecord>>> = HashMap::new();
        for (_, code) in &answered {
            if !results.contains_key(code) {
                let result = self.lookup(code).await;
                results.insert(code.clone(), result);
            }
        }

        answered
            .into_iter()
            .map(|(position, code)| {
                let duplicate = duplicates.contains(&code);
                let result = &results[&code];
                CardEntry::new(position.id, position.display_name(), code, result)
                    .with_duplicate(duplicate)
            })
            .collect()
    }

    /// Checkout-time validation of a whole cart/order.
    ///
    /// Returns `CheckoutAborted` carrying the combined message when any
    /// entry is not acceptable.
    pub async fn validate_checkout(
        &self,
        positions: &[Position],
        submitted: &SubmittedAnswers,
    ) -> Result<(), CheckoutAborted> {
        let entries = self.resolve_entries(positions, submitted).await;

        for entry in entries.iter().filter(|e| !e.is_acceptable()) {
            info!(
                name = %entry.name,
                card_number = %entry.card_number,
                status = ?entry.status,
                duplicate = entry.duplicate,
                "ESNcard validation failed"
            );
        }

        let message = compose_report(&entries, &self.messages);
        if message.is_empty() {
            Ok(())
        } else {
            Err(CheckoutAborted { message, entries })
        }
    }
}
