//! # esn-api
//!
//! HTTP validation hooks for esncard-validator-rs.
//!
//! The ticketing platform calls these endpoints from its checkout flow and
//! treats a `422` answer as "abort and show `message`".
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/validate/field` | Validate one ESNcard answer |
//! | POST | `/api/v1/validate/checkout` | Validate every ESNcard of an order |
//! | GET | `/api/v1/settings` | Read global settings |
//! | PUT | `/api/v1/settings` | Rotate the registry bypass token |

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppConfig, AppState};
