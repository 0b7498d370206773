//! # Duplicate Detection
//!
//! Each attendee in a cart or order needs their own ESNcard.

use crate::card::CardCode;
use crate::position::{Position, PositionId, Question, SubmittedAnswers};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Does any sibling position (other than `position_id`) carry the same code?
///
/// Sibling values come from the submitted form when present, so an answer
/// that was just edited is compared by its new value.
pub fn is_duplicate(
    code: &CardCode,
    position_id: PositionId,
    question: &Question,
    siblings: &[Position],
    submitted: &SubmittedAnswers,
) -> bool {
    siblings
        .iter()
        .filter(|sibling| sibling.id != position_id)
        .filter_map(|sibling| {
            let sibling_question = sibling
                .esncard_question()
                .unwrap_or_else(|| question.clone());
            submitted.current_card_answer(sibling, &sibling_question)
        })
        .filter_map(|answer| CardCode::parse(&answer))
        .any(|other| {
            let hit = &other == code;
            if hit {
                debug!(code = %code, "Card number used by another position");
            }
            hit
        })
}

/// Codes that occur more than once in `codes`.
pub fn duplicate_codes<'a>(codes: impl IntoIterator<Item = &'a CardCode>) -> HashSet<CardCode> {
    let mut counts: HashMap<&CardCode, usize> = HashMap::new();
    for code in codes {
        *counts.entry(code).or_default() += 1;
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(code, _)| code.clone())
        .collect()
}
