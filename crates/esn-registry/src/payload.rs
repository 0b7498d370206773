//! # Registry Payloads
//!
//! The card endpoint has answered with a bare object in some API versions
//! and with a list of zero or one objects in others. Both are folded into
//! `Option<CardRecord>` here; anything else is a protocol violation.

use esn_core::{CardCode, CardRecord, CardStatus, RegistryError, RegistryResult};
use serde::Deserialize;
use serde_json::Value;

/// Card object as sent by the registry. Unknown fields are kept in `raw`.
#[derive(Debug, Deserialize)]
struct RegistryCard {
    #[serde(default)]
    code: Option<String>,
    status: String,
    #[serde(default, rename = "expiration-date")]
    expiration_date: Option<String>,
}

/// Parse a card endpoint body.
///
/// - `[]` or `{}`: card does not exist
/// - `[{..}]` or `{..}`: that card
/// - anything else: `MalformedResponse` / `UnexpectedShape`
pub fn parse_card_payload(body: &str, queried: &CardCode) -> RegistryResult<Option<CardRecord>> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        RegistryError::MalformedResponse(format!("Invalid JSON from registry: {}", e))
    })?;

    let object = match value {
        Value::Array(mut items) => match items.len() {
            0 => return Ok(None),
            1 => items.remove(0),
            n => {
                return Err(RegistryError::UnexpectedShape(format!(
                    "Expected at most one card, registry returned {}",
                    n
                )))
            }
        },
        other => other,
    };

    match object {
        Value::Object(ref map) if map.is_empty() => Ok(None),
        Value::Object(_) => card_from_object(object, queried).map(Some),
        other => Err(RegistryError::UnexpectedShape(format!(
            "Expected a card object, got {}",
            json_kind(&other)
        ))),
    }
}

fn card_from_object(object: Value, queried: &CardCode) -> RegistryResult<CardRecord> {
    let card: RegistryCard = serde_json::from_value(object.clone())
        .map_err(|e| RegistryError::UnexpectedShape(format!("Invalid card object: {}", e)))?;

    let code = card
        .code
        .as_deref()
        .and_then(CardCode::parse)
        .unwrap_or_else(|| queried.clone());

    let mut record = CardRecord::new(code, CardStatus::from(card.status)).with_raw(object);
    if let Some(date) = card.expiration_date.filter(|d| !d.trim().is_empty()) {
        record = record.with_expiration_date(date);
    }

    Ok(record)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
