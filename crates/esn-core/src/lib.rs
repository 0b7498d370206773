//! # esn-core
//!
//! Core types and rules for validating ESNcard numbers at checkout.
//!
//! This crate provides:
//! - `CardCode`, `CardStatus` and `CardRecord` for registry data
//! - `CardLookup` trait for anything that can answer "what is card X"
//! - `CardCache` and `CachedCardLookup` for short-lived result caching
//! - `Position` and `SubmittedAnswers` for what the host platform supplies
//! - `Validator` for per-field and checkout-time validation
//! - `Rejection`, `CheckoutAborted` and `RegistryError` for typed errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use esn_core::{CachedCardLookup, CardCache, MessageConfig, Validator};
//!
//! let cache = Arc::new(CardCache::default());
//! let lookup = Arc::new(CachedCardLookup::new(registry_client, cache));
//! let validator = Validator::new(lookup, MessageConfig::default());
//!
//! // Block checkout if any ESNcard in the order is unusable
//! if let Err(aborted) = validator.validate_checkout(&positions, &submitted).await {
//!     // Show aborted.message to the customer
//! }
//! ```

pub mod cache;
pub mod card;
pub mod duplicate;
pub mod entry;
pub mod error;
pub mod lookup;
pub mod messages;
pub mod position;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use cache::{CacheLookup, CachedCardLookup, CardCache, DEFAULT_CACHE_TTL};
pub use card::{normalize, CardCode, CardRecord, CardStatus};
pub use duplicate::{duplicate_codes, is_duplicate};
pub use entry::{CardEntry, EntryStatus};
pub use error::{CheckoutAborted, RegistryError, RegistryResult, Rejection, RETRYABLE_STATUSES};
pub use lookup::{BoxedCardLookup, BoxedSettingsSource, CardLookup, SettingsSource, SettingsStore};
pub use messages::{compose_report, MessageConfig, ReportGroup};
pub use position::{
    Answer, Position, PositionId, Question, QuestionId, SubmittedAnswers,
    ESNCARD_QUESTION_IDENTIFIER,
};
pub use validator::Validator;
