//! # Host Positions
//!
//! What the ticketing platform hands us: cart/order positions (line items),
//! their questions and persisted answers, plus the form values currently
//! being submitted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Identifier of the question that carries the ESNcard number
pub const ESNCARD_QUESTION_IDENTIFIER: &str = "esncard";

/// Position ID as assigned by the host platform
pub type PositionId = u64;

/// Question ID as assigned by the host platform
pub type QuestionId = u64;

/// A question attached to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub identifier: String,
}

impl Question {
    pub fn new(id: QuestionId, identifier: impl Into<String>) -> Self {
        Self {
            id,
            identifier: identifier.into(),
        }
    }

    /// The ESNcard question with the given ID
    pub fn esncard(id: QuestionId) -> Self {
        Self::new(id, ESNCARD_QUESTION_IDENTIFIER)
    }

    pub fn is_esncard(&self) -> bool {
        self.identifier == ESNCARD_QUESTION_IDENTIFIER
    }
}

/// A persisted answer to a question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub question_identifier: String,
    pub value: String,
}

/// A cart or order position (one ticket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_name: Option<String>,

    /// Questions configured on the position's product
    #[serde(default)]
    pub questions: Vec<Question>,

    /// Answers already stored by the host platform
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Position {
    pub fn new(id: PositionId) -> Self {
        Self {
            id,
            attendee_name: None,
            questions: Vec::new(),
            answers: Vec::new(),
        }
    }

    pub fn with_attendee(mut self, name: impl Into<String>) -> Self {
        self.attendee_name = Some(name.into());
        self
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    /// Store an ESNcard answer, adding the question if the product lacks it.
    pub fn with_card_answer(mut self, question_id: QuestionId, value: impl Into<String>) -> Self {
        if !self.questions.iter().any(|q| q.id == question_id) {
            self.questions.push(Question::esncard(question_id));
        }
        self.answers.push(Answer {
            question_id,
            question_identifier: ESNCARD_QUESTION_IDENTIFIER.to_string(),
            value: value.into(),
        });
        self
    }

    /// The product's ESNcard question, if it asks for one.
    pub fn esncard_question(&self) -> Option<Question> {
        self.questions
            .iter()
            .find(|q| q.is_esncard())
            .cloned()
            .or_else(|| {
                self.answers
                    .iter()
                    .find(|a| a.question_identifier == ESNCARD_QUESTION_IDENTIFIER)
                    .map(|a| Question::esncard(a.question_id))
            })
    }

    /// The stored ESNcard answer, if any.
    pub fn persisted_card_answer(&self) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.question_identifier == ESNCARD_QUESTION_IDENTIFIER)
            .map(|a| a.value.as_str())
    }

    /// Name used in user-facing messages
    pub fn display_name(&self) -> &str {
        self.attendee_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Unnamed attendee")
    }
}

/// Form values of the request being validated, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmittedAnswers(HashMap<String, String>);

impl SubmittedAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form field name the host uses for a position's answer.
    pub fn field_name(position_id: PositionId, question_id: QuestionId) -> String {
        format!("{}-question_{}", position_id, question_id)
    }

    pub fn insert(
        &mut self,
        position_id: PositionId,
        question_id: QuestionId,
        value: impl Into<String>,
    ) {
        self.0
            .insert(Self::field_name(position_id, question_id), value.into());
    }

    pub fn with_answer(
        mut self,
        position_id: PositionId,
        question_id: QuestionId,
        value: impl Into<String>,
    ) -> Self {
        self.insert(position_id, question_id, value);
        self
    }

    /// Submitted value for a position's question. A field that is present
    /// but blank yields `Some("")`: the attendee cleared it.
    pub fn get(&self, position_id: PositionId, question_id: QuestionId) -> Option<&str> {
        self.0
            .get(&Self::field_name(position_id, question_id))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Current ESNcard answer of a position: the value being submitted when
    /// the field is in the form (even if blank), otherwise what the host has
    /// stored.
    pub fn current_card_answer(&self, position: &Position, question: &Question) -> Option<String> {
        if let Some(value) = self.get(position.id, question.id) {
            return Some(value.to_string());
        }

        if !self.is_empty() {
            warn!(
                field = %Self::field_name(position.id, question.id),
                "ESNcard field missing from submitted form, using stored answer"
            );
        } else {
            debug!(position_id = position.id, "No submitted form, using stored answer");
        }

        position.persisted_card_answer().map(String::from)
    }
}
