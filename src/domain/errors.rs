//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Fatal for a single event: empty title, or a non-positive duration that
    /// survived normalization (the latter indicates a normalizer bug).
    #[error("invalid event: {0}")]
    Validation(String),

    /// Suggestion provider cannot be reached or returned garbage. Callers
    /// degrade to an empty candidate list.
    #[error("suggestion provider unavailable: {0}")]
    Provider(String),

    #[error("calendar backend error: {0}")]
    Calendar(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("input error: {0}")]
    Input(String),
}
