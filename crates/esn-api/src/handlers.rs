//! # Request Handlers
//!
//! Validation hooks called by the ticketing platform.
//!
//! The platform calls `validate_field` while an attendee fills in the
//! ESNcard question, and `validate_checkout` right before an order is
//! placed. A `422` answer means "show `message` and do not proceed".

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use esn_core::{CardEntry, Position, SubmittedAnswers};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Per-field validation request
#[derive(Debug, Deserialize)]
pub struct FieldValidationRequest {
    /// Position whose ESNcard field is being validated
    pub position: Position,
    /// Value typed into the field
    #[serde(default)]
    pub answer: String,
    /// All positions of the same cart/order
    #[serde(default)]
    pub siblings: Vec<Position>,
    /// Form values of the current request, keyed by field name
    #[serde(default)]
    pub submitted: SubmittedAnswers,
}

/// Checkout validation request
#[derive(Debug, Deserialize)]
pub struct CheckoutValidationRequest {
    /// All positions of the cart/order
    pub positions: Vec<Position>,
    /// Form values of the current request, keyed by field name
    #[serde(default)]
    pub submitted: SubmittedAnswers,
}

/// Validation response
#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<CardEntry>,
}

impl ValidationResponse {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
            kind: None,
            entries: Vec::new(),
        }
    }

    pub fn rejected(message: impl Into<String>, kind: &'static str) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            kind: Some(kind),
            entries: Vec::new(),
        }
    }

    fn into_reply(self) -> (StatusCode, Json<ValidationResponse>) {
        let status = if self.valid {
            StatusCode::OK
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        (status, Json(self))
    }
}

/// Global settings update
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    /// New bypass token; `null` or blank clears it
    #[serde(default)]
    pub bypass_token: Option<String>,
}

/// Global settings as exposed over the API (secrets are never echoed)
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub bypass_token_configured: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "esncard-validator",
        "version": env!("CARGO_PKG_VERSION"),
        "cached_cards": state.cache.len()
    }))
}

/// Validate one ESNcard field
#[instrument(
    skip(state, request),
    fields(position_id = request.position.id, siblings = request.siblings.len())
)]
pub async fn validate_field(
    State(state): State<AppState>,
    Json(request): Json<FieldValidationRequest>,
) -> (StatusCode, Json<ValidationResponse>) {
    let outcome = state
        .validator
        .validate_field(
            &request.answer,
            &request.position,
            &request.siblings,
            &request.submitted,
        )
        .await;

    let response = match outcome {
        Ok(()) => ValidationResponse::valid(),
        Err(rejection) => ValidationResponse::rejected(rejection.to_string(), rejection.kind()),
    };
    response.into_reply()
}

/// Validate every ESNcard of an order before checkout
#[instrument(skip(state, request), fields(positions = request.positions.len()))]
pub async fn validate_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutValidationRequest>,
) -> (StatusCode, Json<ValidationResponse>) {
    match state
        .validator
        .validate_checkout(&request.positions, &request.submitted)
        .await
    {
        Ok(()) => ValidationResponse::valid().into_reply(),
        Err(aborted) => ValidationResponse {
            valid: false,
            message: Some(aborted.message),
            kind: Some("checkout_aborted"),
            entries: aborted.entries,
        }
        .into_reply(),
    }
}

/// Read global settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        bypass_token_configured: state.settings.has_bypass_token(),
    })
}

/// Rotate the bypass token. Takes effect on the next registry request.
#[instrument(skip(state, request))]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    if let Some(token) = &request.bypass_token {
        if !token.trim().chars().all(|c| c.is_ascii_graphic()) {
            return Err(ApiError::InvalidSetting(
                "bypass_token may only contain printable ASCII characters".to_string(),
            ));
        }
    }

    state.settings.set_bypass_token(request.bypass_token);
    info!(
        configured = state.settings.has_bypass_token(),
        "ESNcard bypass token updated"
    );

    Ok(Json(SettingsResponse {
        bypass_token_configured: state.settings.has_bypass_token(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::create_router;
    use crate::state::AppConfig;
    use async_trait::async_trait;
    use axum_test::TestServer;
    use esn_core::{
        CardCode, CardLookup, CardRecord, CardStatus, MessageConfig, RegistryError,
        RegistryResult, SettingsSource, SettingsStore, DEFAULT_CACHE_TTL,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StaticLookup {
        cards: HashMap<String, CardStatus>,
    }

    #[async_trait]
    impl CardLookup for StaticLookup {
        async fn fetch_card(&self, code: &CardCode) -> RegistryResult<Option<CardRecord>> {
            if code.as_str() == "DOWN" {
                return Err(RegistryError::Network("connection refused".into()));
            }
            Ok(self.cards.get(code.as_str()).map(|status| {
                let record = CardRecord::new(code.clone(), status.clone());
                if *status == CardStatus::Expired {
                    record.with_expiration_date("2024-01-01")
                } else {
                    record
                }
            }))
        }

        fn source_name(&self) -> &'static str {
            "static"
        }
    }

    fn server() -> (TestServer, Arc<SettingsStore>) {
        let cards = HashMap::from([
            ("AB1".to_string(), CardStatus::Active),
            ("AB2".to_string(), CardStatus::Expired),
            ("AB3".to_string(), CardStatus::Available),
        ]);
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            cache_ttl: DEFAULT_CACHE_TTL,
        };
        let settings = Arc::new(SettingsStore::default());
        let state = AppState::with_lookup(
            config,
            Arc::new(StaticLookup { cards }),
            settings.clone(),
            MessageConfig::default(),
        );
        (TestServer::new(create_router(state)).unwrap(), settings)
    }

    fn position(id: u64, name: &str, answer: &str) -> Value {
        json!({
            "id": id,
            "attendee_name": name,
            "questions": [{"id": 4, "identifier": "esncard"}],
            "answers": [{"question_id": 4, "question_identifier": "esncard", "value": answer}]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = server();
        let response = server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_field_active_card() {
        let (server, _) = server();
        let response = server
            .post("/api/v1/validate/field")
            .json(&json!({ "position": position(1, "Ann", "ab1"), "answer": " ab1 " }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "valid": true }));
    }

    #[tokio::test]
    async fn test_field_expired_card() {
        let (server, _) = server();
        let response = server
            .post("/api/v1/validate/field")
            .json(&json!({ "position": position(1, "Ann", "AB2"), "answer": "AB2" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<Value>();
        assert_eq!(body["kind"], "expired");
        assert_eq!(body["message"], "The ESNcard expired on 2024-01-01.");
    }

    #[tokio::test]
    async fn test_field_duplicate_uses_submitted_values() {
        let (server, _) = server();
        let response = server
            .post("/api/v1/validate/field")
            .json(&json!({
                "position": position(1, "Ann", "AB1"),
                "answer": "AB1",
                "siblings": [position(1, "Ann", "AB1"), position(2, "Ben", "ZZ9")],
                "submitted": { "2-question_4": "ab 1" }
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["kind"], "duplicate");
    }

    #[tokio::test]
    async fn test_field_service_failure_hides_detail() {
        let (server, _) = server();
        let response = server
            .post("/api/v1/validate/field")
            .json(&json!({ "position": position(1, "Ann", "DOWN"), "answer": "DOWN" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<Value>();
        assert_eq!(body["kind"], "service_unavailable");
        assert!(!body["message"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_checkout_aborted() {
        let (server, _) = server();
        let response = server
            .post("/api/v1/validate/checkout")
            .json(&json!({
                "positions": [
                    position(1, "Ann", "AB1"),
                    position(2, "Ben", "AB2"),
                    position(3, "Cid", "ab1"),
                ]
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body = response.json::<Value>();
        assert_eq!(body["valid"], false);
        assert_eq!(body["kind"], "checkout_aborted");
        assert_eq!(body["entries"].as_array().unwrap().len(), 3);
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("The ESNcard of Ben (AB2) expired on 2024-01-01."));
        assert!(message.contains("Ann (AB1) and Cid (AB1) are used more than once"));
    }

    #[tokio::test]
    async fn test_checkout_ok() {
        let (server, _) = server();
        let response = server
            .post("/api/v1/validate/checkout")
            .json(&json!({ "positions": [position(1, "Ann", "AB1"), position(2, "Ben", "")] }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "valid": true }));
    }

    #[tokio::test]
    async fn test_settings_rotation() {
        let (server, settings) = server();

        let response = server.get("/api/v1/settings").await;
        assert_eq!(
            response.json::<Value>(),
            json!({ "bypass_token_configured": false })
        );

        let response = server
            .put("/api/v1/settings")
            .json(&json!({ "bypass_token": "tok-123" }))
            .await;
        response.assert_status_ok();
        assert_eq!(settings.bypass_token().as_deref(), Some("tok-123"));

        let response = server
            .put("/api/v1/settings")
            .json(&json!({ "bypass_token": "bad\ntoken" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(settings.bypass_token().as_deref(), Some("tok-123"));

        server
            .put("/api/v1/settings")
            .json(&json!({ "bypass_token": null }))
            .await
            .assert_status_ok();
        assert!(!settings.has_bypass_token());
    }
}
