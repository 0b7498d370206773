//! # Validation Error Types
//!
//! Typed error handling for ESNcard validation.
//!
//! Two families live here:
//! - `RegistryError`: anything that went wrong talking to the card registry.
//!   These never reach the end user verbatim.
//! - `Rejection`: a business-rule outcome for one card, whose `Display` is the
//!   message shown at checkout.

use thiserror::Error;

/// HTTP statuses that are retried before giving up on the registry
pub const RETRYABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Errors raised while fetching a card from the registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Connection refused, DNS failure, timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Registry answered with a non-success status (after retries)
    #[error("Registry returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Body was not valid JSON
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Valid JSON, but not a shape the registry is known to return
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RegistryError {
    /// Only transient server-side statuses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::HttpStatus { status, .. } if RETRYABLE_STATUSES.contains(status)
        )
    }
}

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Why a single card answer was refused.
///
/// The `Display` output is user facing. `ServiceUnavailable` intentionally
/// carries no detail from the underlying `RegistryError`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("Couldn't find an ESNcard with this number, please check for typos.")]
    NotFound,

    #[error(
        "The ESNcard is not registered, please register it on {registration_url}. \
         If you recently registered your card, it may take a few hours before it's updated in the systems."
    )]
    Unregistered { registration_url: String },

    #[error("The ESNcard expired on {date}.")]
    Expired { date: String },

    #[error("Duplicate number. Each person must have a unique ESNcard.")]
    Duplicate,

    #[error("ESNcard validation failed, please contact {support_contact}.")]
    Invalid { support_contact: String },

    #[error(
        "Verification is temporarily unavailable. Please try again later. \
         If the issue persists, contact {support_contact}."
    )]
    ServiceUnavailable { support_contact: String },
}

impl Rejection {
    /// Short machine-readable kind, used in logs and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::NotFound => "not_found",
            Rejection::Unregistered { .. } => "unregistered",
            Rejection::Expired { .. } => "expired",
            Rejection::Duplicate => "duplicate",
            Rejection::Invalid { .. } => "invalid",
            Rejection::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    /// True when the rejection is caused by the registry, not the card.
    pub fn is_service_failure(&self) -> bool {
        matches!(self, Rejection::ServiceUnavailable { .. })
    }
}

/// Raised when one or more card entries in an order fail validation.
/// The host platform must abort checkout and display `message`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CheckoutAborted {
    pub message: String,
    pub entries: Vec<crate::entry::CardEntry>,
}
