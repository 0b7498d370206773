//! # ESNcard Validator
//!
//! Checkout-time ESNcard validation service.
//!
//! ## Usage
//!
//! ```bash
//! # Optional: token for the registry CDN's bot protection
//! export ESNCARD_CF_TOKEN=...
//!
//! # Run the server
//! esncard-validator
//! ```

use esn_api::{routes, state::AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;

    info!("Environment: {}", state.config.environment);
    info!("Card cache TTL: {}s", state.config.cache_ttl.as_secs());
    info!(
        "Bypass token configured: {}",
        state.settings.has_bypass_token()
    );

    // Evict stale cache entries in the background
    let cache = Arc::clone(&state.cache);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cache.ttl().max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, "Purged expired card cache entries");
            }
        }
    });

    let is_prod = state.config.is_production();

    // Create router
    let app = routes::create_router(state);

    info!("ESNcard validator starting on http://{}", addr);

    if !is_prod {
        info!("Field hook: POST http://{}/api/v1/validate/field", addr);
        info!("Checkout hook: POST http://{}/api/v1/validate/checkout", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
