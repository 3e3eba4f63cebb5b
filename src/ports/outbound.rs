//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use serde_json::Value;

use crate::domain::{CalendarEvent, DomainError, EventDraft};

/// LLM suggestion provider. Turns one instruction into candidate drafts.
#[async_trait::async_trait]
pub trait SuggestionPort: Send + Sync {
    /// Ask the model for candidate events.
    ///
    /// `now_iso` anchors relative phrases ("tomorrow morning"); `timezone` is
    /// the zone the instruction should be read in. Unavailability maps to
    /// `DomainError::Provider`; callers degrade to an empty candidate list.
    async fn suggest_events(
        &self,
        instruction: &str,
        now_iso: &str,
        timezone: &str,
    ) -> Result<Vec<EventDraft>, DomainError>;
}

/// Calendar backend. Create/update events and list raw event payloads.
#[async_trait::async_trait]
pub trait CalendarPort: Send + Sync {
    /// Create an event; returns the backend identifier.
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, DomainError>;

    /// Update the event stored under `event_id`; returns the identifier.
    async fn update_event(
        &self,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, DomainError>;

    /// Raw event payloads between two ISO timestamps. Items may carry start/end
    /// as plain ISO strings or as `{dateTime|date}` objects; the caller owns
    /// the parsing and discards what fits neither shape.
    async fn list_between(
        &self,
        time_min_iso: &str,
        time_max_iso: &str,
    ) -> Result<Vec<Value>, DomainError>;
}

/// Local store. OAuth tokens plus a mirror of calendar payloads that serves
/// dry-run operation.
#[async_trait::async_trait]
pub trait EventStorePort: Send + Sync {
    async fn save_token(&self, provider: &str, data: &str) -> Result<(), DomainError>;

    async fn load_token(&self, provider: &str) -> Result<Option<String>, DomainError>;

    /// Upsert one payload under the given event id. Payloads without
    /// readable start/end are ignored.
    async fn save_payload(&self, event_id: &str, payload: &Value) -> Result<(), DomainError>;

    /// Payloads overlapping [time_min, time_max), ordered by start.
    async fn list_between(
        &self,
        time_min_iso: &str,
        time_max_iso: &str,
    ) -> Result<Vec<Value>, DomainError>;

    /// Every stored payload, ordered by start. Used by the inspection menu.
    async fn list_all(&self) -> Result<Vec<Value>, DomainError>;
}
