//! # Routes
//!
//! Axum router configuration for the validation API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health - Health check
/// - POST /api/v1/validate/field - Validate one ESNcard answer
/// - POST /api/v1/validate/checkout - Validate all ESNcards of an order
/// - GET  /api/v1/settings - Read global settings
/// - PUT  /api/v1/settings - Rotate the bypass token
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let validate_routes = Router::new()
        .route("/field", post(handlers::validate_field))
        .route("/checkout", post(handlers::validate_checkout));

    let api_routes = Router::new()
        .nest("/validate", validate_routes)
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        );

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // API v1
        .nest("/api/v1", api_routes)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}
